// Domain layer: grid model and ports (interfaces). No HTTP or filesystem code lives here.

pub mod model;
pub mod ports;
