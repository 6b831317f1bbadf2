mod postgres;
mod scans;
mod store_errors;
