mod handler;

pub use handler::{
    get_org_info, get_tenants, get_usage_limits, get_workspace_stats, get_workspace_tags,
    get_workspaces,
};
