use anyhow::Result;
use k8s_openapi::api::core::v1::Pod;
use kube::api::AttachParams;
use kube::{Api, Client};
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Captured output of a non-interactive command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    /// Stdout followed by a `STDERR:` section when the command wrote to stderr.
    pub fn render(&self) -> String {
        let mut result = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str("STDERR: ");
            result.push_str(&self.stderr);
        }
        result
    }
}

pub fn shell_command(command: &str) -> Vec<String> {
    vec!["/bin/sh".to_string(), "-c".to_string(), command.to_string()]
}

/// Runs `command` through `/bin/sh -c` in the pod's default container.
pub async fn run_command(client: Client, namespace: &str, pod: &str, command: &str) -> Result<ExecOutput> {
    let pods: Api<Pod> = Api::namespaced(client, namespace);
    let ap = AttachParams::default().stdin(false).stdout(true).stderr(true);

    debug!(namespace, pod, command, "exec in pod");
    let mut attached = pods.exec(pod, shell_command(command), &ap).await?;

    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();

    let mut stdout = attached.stdout().ok_or_else(|| anyhow::anyhow!("exec: stdout not available"))?;
    let mut stderr = attached.stderr().ok_or_else(|| anyhow::anyhow!("exec: stderr not available"))?;

    tokio::try_join!(stdout.read_to_end(&mut stdout_buf), stderr.read_to_end(&mut stderr_buf))?;

    attached.join().await?;

    Ok(ExecOutput {
        stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
    })
}
