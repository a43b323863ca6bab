mod connect;
mod consume;
mod exchange;
mod publish;
mod queue;
