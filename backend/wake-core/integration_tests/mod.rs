mod error;
mod helpers;
mod listener;
mod scripts;
