//! Runner provisioning and launch
//!
//! Handles the host side of a self-hosted runner:
//! - Downloading and unpacking the runner release on first use
//! - Registering it with `config.sh` using a fresh registration token
//! - Spawning `run.sh` and handing the process to the caller

use gantry_core::domain::runner::RunnerLaunch;
use reqwest::header::USER_AGENT;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::wire::Release;
use crate::{GitHubClient, USER_AGENT_VALUE};

/// Release archive platform name for an OS/architecture pair
pub(crate) fn runner_platform(os: &str, arch: &str) -> Option<&'static str> {
    match (os, arch) {
        ("linux", "x86_64") => Some("linux-x64"),
        ("linux", "aarch64") => Some("linux-arm64"),
        ("linux", "arm") => Some("linux-arm"),
        ("macos", "x86_64") => Some("osx-x64"),
        ("macos", "aarch64") => Some("osx-arm64"),
        _ => None,
    }
}

/// Download URL of a runner release archive
///
/// `tag` is the release tag (`v2.311.0`); archive names carry the bare version.
pub(crate) fn archive_url(download_base: &str, tag: &str, platform: &str) -> String {
    let version = tag.strip_prefix('v').unwrap_or(tag);
    format!(
        "{}/{}/actions-runner-{}-{}.tar.gz",
        download_base.trim_end_matches('/'),
        tag,
        platform,
        version
    )
}

/// Arguments passed to `config.sh`
pub(crate) fn config_args(repo_url: &str, token: &str, launch: &RunnerLaunch) -> Vec<String> {
    let mut args = vec![
        "--unattended".to_string(),
        "--token".to_string(),
        token.to_string(),
        "--url".to_string(),
        repo_url.to_string(),
        "--name".to_string(),
        launch.name.clone(),
        "--labels".to_string(),
        launch.labels.join(","),
        "--work".to_string(),
        launch.workdir.join("_work").to_string_lossy().to_string(),
    ];
    if launch.ephemeral {
        args.push("--ephemeral".to_string());
    }
    args
}

fn io_err(context: impl std::fmt::Display) -> impl FnOnce(std::io::Error) -> ClientError {
    move |e| ClientError::RunnerSetup(format!("{}: {}", context, e))
}

impl GitHubClient {
    /// Configure and launch a self-hosted runner in `launch.workdir`
    ///
    /// Downloads the runner release if the work directory has none, registers
    /// the runner with a fresh token, and spawns `run.sh` with piped output.
    /// The returned process is not awaited; the caller owns it.
    pub async fn start_runner(&self, launch: RunnerLaunch) -> Result<Child> {
        self.prepare_runner(&launch).await.map_err(|e| match e {
            ClientError::RunnerSetup(_) => e,
            other => ClientError::RunnerSetup(other.to_string()),
        })
    }

    async fn prepare_runner(&self, launch: &RunnerLaunch) -> Result<Child> {
        let workdir = &launch.workdir;
        tokio::fs::create_dir_all(workdir)
            .await
            .map_err(io_err(format!("creating {}", workdir.display())))?;

        // A leftover registration makes config.sh refuse to run
        let stale = workdir.join(".runner");
        if tokio::fs::try_exists(&stale)
            .await
            .map_err(io_err("checking .runner"))?
        {
            debug!("Removing stale runner registration {}", stale.display());
            tokio::fs::remove_file(&stale)
                .await
                .map_err(io_err("removing .runner"))?;
        }

        if !tokio::fs::try_exists(workdir.join("config.sh"))
            .await
            .map_err(io_err("checking config.sh"))?
        {
            self.provision_runner(workdir).await?;
        }

        let token = self.runner_token().await?;

        info!("Configuring runner {} for {}", launch.name, self.repo);
        let status = Command::new(workdir.join("config.sh"))
            .args(config_args(&self.repo, &token, launch))
            .current_dir(workdir)
            .status()
            .await
            .map_err(io_err("running config.sh"))?;
        if !status.success() {
            return Err(ClientError::RunnerSetup(format!(
                "config.sh exited with {}",
                status
            )));
        }

        info!("Starting runner {}", launch.name);
        Command::new(workdir.join("run.sh"))
            .current_dir(workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(io_err("spawning run.sh"))
    }

    /// Download and unpack the latest runner release into `workdir`
    async fn provision_runner(&self, workdir: &Path) -> Result<()> {
        let platform = runner_platform(std::env::consts::OS, std::env::consts::ARCH)
            .ok_or_else(|| {
                ClientError::RunnerSetup(format!(
                    "no runner release for {}-{}",
                    std::env::consts::OS,
                    std::env::consts::ARCH
                ))
            })?;

        let response = self
            .client
            .get(&self.config.runner_release_url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .send()
            .await?;
        let release: Release = self.handle_response(response).await?;

        let url = archive_url(&self.config.runner_download_base, &release.tag_name, platform);
        let archive = workdir.join("actions-runner.tar.gz");
        info!("Downloading runner {} from {}", release.tag_name, url);
        self.download(&url, &archive).await?;

        let status = Command::new("tar")
            .arg("-xzf")
            .arg(&archive)
            .arg("-C")
            .arg(workdir)
            .status()
            .await
            .map_err(io_err("running tar"))?;
        if !status.success() {
            return Err(ClientError::RunnerSetup(format!("tar exited with {}", status)));
        }

        tokio::fs::remove_file(&archive)
            .await
            .map_err(io_err("removing runner archive"))?;
        make_executable(workdir).await
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<()> {
        let mut response = self
            .client
            .get(url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::api_error(
                response.status().as_u16(),
                format!("downloading {}", url),
            ));
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(io_err(format!("creating {}", destination.display())))?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(io_err("writing runner archive"))?;
        }
        file.flush().await.map_err(io_err("writing runner archive"))?;
        Ok(())
    }
}

/// Mark the runner scripts and everything under `bin/` executable
#[cfg(unix)]
async fn make_executable(workdir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut pending: Vec<PathBuf> = vec![workdir.join("config.sh"), workdir.join("run.sh")];
    let mut dirs = vec![workdir.join("bin")];

    while let Some(dir) = dirs.pop() {
        let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
            continue;
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(io_err(format!("reading {}", dir.display())))?
        {
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            } else {
                pending.push(path);
            }
        }
    }

    for path in pending {
        let Ok(metadata) = tokio::fs::metadata(&path).await else {
            continue;
        };
        let mut permissions = metadata.permissions();
        permissions.set_mode(permissions.mode() | 0o755);
        tokio::fs::set_permissions(&path, permissions)
            .await
            .map_err(io_err(format!("chmod {}", path.display())))?;
    }

    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_workdir: &Path) -> Result<()> {
    Ok(())
}
