mod config_flow;
mod readiness_flow;
mod transfer_flow;
