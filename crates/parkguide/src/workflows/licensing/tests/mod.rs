mod alerts;
mod common;
mod expiry;
