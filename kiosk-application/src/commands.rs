pub mod capture_commands;
pub mod classify_commands;
pub mod cycle_commands;
pub mod measure_commands;
pub mod reward_commands;
