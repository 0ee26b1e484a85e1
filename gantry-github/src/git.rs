//! Git remote configuration

use url::Url;

use crate::GitHubClient;
use crate::error::{ClientError, Result};

/// Quote a value for a POSIX shell
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

impl GitHubClient {
    /// Render a shell command that sets the committer identity and points
    /// `origin` at the repository with the token embedded as credentials
    ///
    /// The command is only rendered, never executed. Previously configured
    /// identity, push default and Actions auth header are unset first; those
    /// unsets tolerate missing keys.
    ///
    /// # Arguments
    /// * `user_name` - Committer name, defaults to the configured identity
    /// * `user_email` - Committer email, defaults to the configured identity
    pub fn update_git_config(
        &self,
        user_name: Option<&str>,
        user_email: Option<&str>,
    ) -> Result<String> {
        let mut remote = Url::parse(&self.repo)
            .map_err(|e| ClientError::Config(format!("invalid repository URL: {}", e)))?;
        remote
            .set_username("token")
            .and_then(|_| remote.set_password(Some(&self.token)))
            .map_err(|_| ClientError::Config("repository URL cannot hold credentials".into()))?;

        let mut remote = remote.to_string();
        if !remote.ends_with(".git") {
            remote.push_str(".git");
        }

        let user_name = user_name.unwrap_or(&self.config.user_name);
        let user_email = user_email.unwrap_or(&self.config.user_email);

        let commands = [
            "git config --unset user.name || true".to_string(),
            "git config --unset user.email || true".to_string(),
            "git config --unset push.default || true".to_string(),
            "git config --unset http.https://github.com/.extraheader || true".to_string(),
            format!("git config user.name {}", shell_quote(user_name)),
            format!("git config user.email {}", shell_quote(user_email)),
            format!("git remote set-url origin {}", shell_quote(&remote)),
        ];

        Ok(commands.join(" && "))
    }
}
