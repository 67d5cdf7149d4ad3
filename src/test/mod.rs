mod link_state;
mod network_integration;
mod topology;
