mod common;
mod lifecycle;
mod steps;
