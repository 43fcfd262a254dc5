//! Console and file-backed stand-ins for the phone's camera, motion
//! sensors, screen and speech engine.

pub mod camera;
pub mod console;
pub mod sensors;

pub use camera::DirectoryCamera;
pub use console::{ConsoleDisplay, ConsoleSpeech};
pub use sensors::{load_sensor_file, parse_sensor_lines, SensorRecord, SensorReplay};
