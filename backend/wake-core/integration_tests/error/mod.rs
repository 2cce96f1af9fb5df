mod listener;
mod scripts;
