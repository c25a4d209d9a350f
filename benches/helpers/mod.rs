pub mod workflow_builders;
