pub mod status_queries;
