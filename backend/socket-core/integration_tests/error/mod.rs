mod config;
mod socket;
