//! Credential lookup shared by clone and push.

use std::path::PathBuf;

use git2::{Cred, CredentialType, RemoteCallbacks};

/// Builds remote callbacks that authenticate like the git command line does.
///
/// libgit2 invokes the credentials callback again every time the server
/// rejects what it was given, so each source is offered at most once:
/// - SSH keys from `~/.ssh/` (`id_ed25519`, `id_rsa`, `id_ecdsa`)
/// - The SSH agent
/// - The configured git credential helper (HTTPS remotes)
/// - libgit2 default credentials
pub fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    let mut keys = ssh_key_candidates().into_iter();
    let mut tried_agent = false;
    let mut tried_helper = false;
    let mut tried_default = false;

    callbacks.credentials(move |url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(CredentialType::SSH_KEY) {
            for key_path in keys.by_ref() {
                if key_path.exists() {
                    if let Ok(cred) = Cred::ssh_key(username, None, &key_path, None) {
                        tracing::debug!(key = %key_path.display(), "offering ssh key");
                        return Ok(cred);
                    }
                }
            }

            if !tried_agent {
                tried_agent = true;
                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    tracing::debug!("offering ssh agent identity");
                    return Ok(cred);
                }
            }
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) && !tried_helper {
            tried_helper = true;
            if let Ok(config) = git2::Config::open_default() {
                if let Ok(cred) = Cred::credential_helper(&config, url, username_from_url) {
                    tracing::debug!("offering git credential helper result");
                    return Ok(cred);
                }
            }
        }

        if !tried_default {
            tried_default = true;
            return Cred::default();
        }

        Err(git2::Error::from_str(&format!(
            "authentication failed for {}",
            url
        )))
    });

    callbacks
}

fn ssh_key_candidates() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };

    ["id_ed25519", "id_rsa", "id_ecdsa"]
        .iter()
        .map(|name| home.join(".ssh").join(name))
        .collect()
}
