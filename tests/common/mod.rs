//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lambda_local::lifecycle::startup::{prepare, Prepared, StartupError};
use lambda_local::lifecycle::Shutdown;
use lambda_local::SimulatorConfig;
use tempfile::TempDir;

/// Script answering with the event it received as a JSON body.
pub const ECHO_HANDLER: &str = r#"#!/bin/sh
if [ "$1" = "--exports" ]; then echo '["handler"]'; exit 0; fi
event=$(cat)
printf '{"statusCode": 200, "headers": {"content-type": "application/json"}, "body": %s}\n' "$event"
"#;

/// A scratch directory holding route sources and handler scripts.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a plain file.
    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// Write (or overwrite) an executable handler script.
    pub fn script(&self, name: &str, contents: &str) -> PathBuf {
        // Write to a sibling and rename so a running process never sees a half-written file.
        let staging = self.path(&format!(".{name}.tmp"));
        fs::write(&staging, contents).unwrap();
        fs::set_permissions(&staging, fs::Permissions::from_mode(0o755)).unwrap();
        let path = self.path(name);
        fs::rename(&staging, &path).unwrap();
        path
    }
}

/// Handler script exporting `handler` and running `body` for invocations.
pub fn handler_script(body: &str) -> String {
    format!(
        "#!/bin/sh\nif [ \"$1\" = \"--exports\" ]; then echo '[\"handler\"]'; exit 0; fi\n{body}\n"
    )
}

/// A simulator serving on an ephemeral local port.
pub struct Running {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl Running {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config bound to 127.0.0.1 on an ephemeral port.
pub fn local_config(routes: &Path, entrypoint: &Path) -> SimulatorConfig {
    let mut config = SimulatorConfig::new(routes, "handler", entrypoint);
    config.bind_host = "127.0.0.1".to_string();
    config.port = Some(0);
    config
}

/// Run startup and serve in the background.
pub async fn start(config: SimulatorConfig) -> Result<Running, StartupError> {
    let Prepared { server, listener } = prepare(&config).await?;
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    Ok(Running { addr, shutdown })
}
