mod display;
mod network;
mod scripts;
