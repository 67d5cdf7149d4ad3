pub mod error;
pub mod net;
pub mod queue;
pub mod router;
pub mod sim;
pub mod topo;

#[cfg(test)]
mod test;
