mod discovery;
mod dispatch;
mod guard;
mod privilege;
