// src/gpio_cdev.rs
use embedded_hal::digital::InputPin;
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::CdevPin;
use rain_gauge_lib::input::{BinaryInputSource, Level};
use rain_gauge_lib::GaugeError;

/// Rain sensor relay line read through the GPIO character device.
pub struct CdevInput {
    pin: CdevPin,
}

impl CdevInput {
    pub fn new(chip_path: &str, offset: u32) -> Result<Self, GaugeError> {
        let mut chip = Chip::new(chip_path).map_err(|e| GaugeError::Sensor(e.to_string()))?;
        let handle = chip
            .get_line(offset)
            .map_err(|e| GaugeError::Sensor(e.to_string()))?
            .request(LineRequestFlags::INPUT, 0, "rain-gauge")
            .map_err(|e| GaugeError::Sensor(e.to_string()))?;
        let pin = CdevPin::new(handle).map_err(|e| GaugeError::Sensor(e.to_string()))?;
        Ok(Self { pin })
    }
}

impl BinaryInputSource for CdevInput {
    fn read_level(&mut self) -> Result<Level, GaugeError> {
        let high = self
            .pin
            .is_high()
            .map_err(|e| GaugeError::Sensor(format!("{e:?}")))?;
        Ok(if high { Level::High } else { Level::Low })
    }
}
