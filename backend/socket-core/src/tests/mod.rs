mod callbacks;
mod config;
mod http;
mod path;
