mod advisories;
mod config;
