// Domain layer: heater models and ports to the Bluetooth stack.

pub mod model;
pub mod ports;
