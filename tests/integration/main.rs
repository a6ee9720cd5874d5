mod config_test;
mod scan_test;
mod search_test;
