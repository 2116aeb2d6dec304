// All handlers here sit behind the identity middleware (/api/*)
pub mod configurations;
pub mod data;
pub mod whoami;
