//! A thin wrapper around [`bollard::Docker`] exposing only the calls the
//! watcher and scheduler need: list, inspect, subscribe to events, and
//! run an exec.

use super::error::DockerError;
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use bollard::models::{ContainerSummary, EventMessage};
use bollard::system::EventsOptions;
use bollard::Docker;
use futures_util::stream::{Stream, StreamExt};
use std::collections::HashMap;

#[derive(Clone)]
pub struct Client {
    inner: Docker,
}

impl Client {
    pub fn connect() -> Result<Self, DockerError> {
        let inner = Docker::connect_with_defaults().map_err(DockerError::Connect)?;
        Ok(Self { inner })
    }

    pub async fn list_running_containers(&self) -> Result<Vec<ContainerSummary>, DockerError> {
        let mut filters = HashMap::new();
        filters.insert("status".to_string(), vec!["running".to_string()]);
        self.inner
            .list_containers(Some(ListContainersOptions {
                all: false,
                filters,
                ..Default::default()
            }))
            .await
            .map_err(DockerError::Api)
    }

    pub async fn inspect(
        &self,
        container_id: &str,
    ) -> Result<bollard::models::ContainerInspectResponse, DockerError> {
        self.inner
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await
            .map_err(DockerError::Api)
    }

    pub fn subscribe_events(
        &self,
    ) -> impl Stream<Item = Result<EventMessage, bollard::errors::Error>> + '_ {
        let mut filters = HashMap::new();
        filters.insert("type".to_string(), vec!["container".to_string()]);
        self.inner
            .events(Some(EventsOptions::<String> {
                since: None,
                until: None,
                filters,
            }))
            .boxed()
    }

    /// Run `argv` inside `container_id` and return its exit code and
    /// captured stdout/stderr.
    pub async fn exec(
        &self,
        container_id: &str,
        argv: &[String],
    ) -> Result<(i32, Vec<u8>, Vec<u8>), DockerError> {
        let created = self
            .inner
            .create_exec(
                container_id,
                CreateExecOptions {
                    cmd: Some(argv.to_vec()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await
            .map_err(DockerError::Api)?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        if let StartExecResults::Attached { mut output, .. } = self
            .inner
            .start_exec(&created.id, None::<StartExecOptions>)
            .await
            .map_err(DockerError::Api)?
        {
            while let Some(chunk) = output.next().await {
                match chunk.map_err(DockerError::Api)? {
                    bollard::container::LogOutput::StdOut { message } => {
                        stdout.extend_from_slice(&message)
                    }
                    bollard::container::LogOutput::StdErr { message } => {
                        stderr.extend_from_slice(&message)
                    }
                    _ => {}
                }
            }
        }

        let inspect = self
            .inner
            .inspect_exec(&created.id)
            .await
            .map_err(DockerError::Api)?;
        let exit_code = inspect.exit_code.unwrap_or(-1) as i32;

        Ok((exit_code, stdout, stderr))
    }
}
