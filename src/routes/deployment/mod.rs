mod handler;
mod model;

pub use handler::{
    create_deployment, delete_deployment, get_deployment, invoke_deployment, list_deployments,
};
pub use model::{DeleteResponse, Deployment, DeploymentInvokeResponse};
