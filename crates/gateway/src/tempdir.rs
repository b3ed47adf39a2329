//! Scoped remote work directories
//!
//! A work directory is created fresh before the wrapped operation runs and
//! removed afterwards on every exit path. Removal is best effort: a cleanup
//! failure is logged and never masks the operation's own result.

use afsctl_errors::{Error, GatewayError};
use afsctl_types::IfsPath;
use std::future::Future;
use tracing::warn;
use uuid::Uuid;

use crate::cl::sh_quote;
use crate::executor::RemoteGateway;

/// Build a unique work directory path under `base` for one operation.
///
/// # Errors
///
/// Returns an error if `base` is not a valid IFS path.
pub fn unique_work_directory(base: &str) -> Result<IfsPath, Error> {
    let base = IfsPath::new(base)?;
    Ok(base.join(&format!("afsctl-{}", Uuid::new_v4().simple()))?)
}

/// Run `operation` inside a freshly created remote directory at `path`,
/// removing the directory afterwards regardless of outcome.
///
/// If the directory cannot be prepared, `operation` is never invoked and
/// the preparation failure is returned.
///
/// # Errors
///
/// Returns [`GatewayError::WorkDirectoryFailed`] when preparation fails, or
/// whatever `operation` returns.
pub async fn with_temp_directory<F, Fut, T>(
    gateway: &dyn RemoteGateway,
    path: &IfsPath,
    operation: F,
) -> Result<T, Error>
where
    F: FnOnce(IfsPath) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let quoted = sh_quote(path.as_str());
    let prepare = gateway
        .run_shell(&format!("rm -rf {quoted} && mkdir -p {quoted}"), None)
        .await?;
    if !prepare.success() {
        return Err(GatewayError::WorkDirectoryFailed {
            path: path.to_string(),
            stderr: prepare.diagnostic().trim().to_string(),
        }
        .into());
    }

    let result = operation(path.clone()).await;

    match gateway.run_shell(&format!("rm -rf {quoted}"), None).await {
        Ok(cleanup) if !cleanup.success() => {
            warn!(path = %path, stderr = %cleanup.stderr, "work directory cleanup failed");
        }
        Err(e) => {
            warn!(path = %path, error = %e, "work directory cleanup failed");
        }
        Ok(_) => {}
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGateway;
    use afsctl_errors::Error;

    #[tokio::test]
    async fn removes_directory_on_success() {
        let gateway = ScriptedGateway::new();
        let path = IfsPath::new("/tmp/afsctl-test").unwrap();

        let result = with_temp_directory(&gateway, &path, |dir| async move {
            assert_eq!(dir.as_str(), "/tmp/afsctl-test");
            Ok(true)
        })
        .await
        .unwrap();

        assert!(result);
        let shells = gateway.shell_commands();
        assert_eq!(shells.len(), 2);
        assert!(shells[0].contains("mkdir -p"));
        assert!(shells[1].starts_with("rm -rf"));
    }

    #[tokio::test]
    async fn removes_directory_when_operation_fails() {
        let gateway = ScriptedGateway::new();
        let path = IfsPath::new("/tmp/afsctl-test").unwrap();

        let result: Result<(), Error> = with_temp_directory(&gateway, &path, |_| async {
            Err(Error::internal("operation blew up"))
        })
        .await;

        assert!(result.is_err());
        let shells = gateway.shell_commands();
        assert_eq!(
            shells
                .iter()
                .filter(|c| c.as_str() == "rm -rf '/tmp/afsctl-test'")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn preparation_failure_skips_operation() {
        let gateway = ScriptedGateway::new();
        gateway.fail_shell_matching("mkdir -p", 1, "permission denied");
        let path = IfsPath::new("/tmp/afsctl-test").unwrap();

        let result: Result<bool, Error> = with_temp_directory(&gateway, &path, |_| async {
            panic!("operation must not run when preparation fails");
        })
        .await;

        match result {
            Err(Error::Gateway(GatewayError::WorkDirectoryFailed { stderr, .. })) => {
                assert_eq!(stderr, "permission denied");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        // Only the failed preparation command was issued.
        assert_eq!(gateway.shell_commands().len(), 1);
    }

    #[test]
    fn unique_work_directories_differ() {
        let a = unique_work_directory("/tmp").unwrap();
        let b = unique_work_directory("/tmp").unwrap();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("/tmp/afsctl-"));
    }
}
