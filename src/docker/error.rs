use thiserror::Error;

#[derive(Debug, Error)]
pub enum DockerError {
    #[error("could not connect to the Docker engine: {0}")]
    Connect(bollard::errors::Error),

    #[error("Docker engine API call failed: {0}")]
    Api(#[from] bollard::errors::Error),

    #[error("container {0} has no ogre.health.* labels")]
    NoChecks(String),

    #[error("external check command failed to spawn: {0}")]
    Spawn(#[from] std::io::Error),
}
