mod error;
mod socket_tests;
