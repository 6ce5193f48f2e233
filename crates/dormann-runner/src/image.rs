//! Test image loading.

use std::fmt;

use emu_core::SimpleBus;

/// Size of the 6502 address space.
const MEMORY_SIZE: usize = 0x1_0000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    Empty,
    TooLarge { len: usize, origin: u16 },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "image is empty"),
            Self::TooLarge { len, origin } => write!(
                f,
                "image of {len} bytes does not fit at ${origin:04X} (room for {})",
                MEMORY_SIZE - usize::from(*origin)
            ),
        }
    }
}

impl std::error::Error for ImageError {}

/// Copy `data` into `bus` at `origin`. The image must fit below $10000.
pub fn load(bus: &mut SimpleBus, origin: u16, data: &[u8]) -> Result<(), ImageError> {
    if data.is_empty() {
        return Err(ImageError::Empty);
    }
    if usize::from(origin) + data.len() > MEMORY_SIZE {
        return Err(ImageError::TooLarge {
            len: data.len(),
            origin,
        });
    }
    bus.load(origin, data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_at_origin() {
        let mut bus = SimpleBus::new();
        load(&mut bus, 0x0400, &[0xA9, 0x01]).expect("fits");
        assert_eq!(bus.peek(0x0400), 0xA9);
        assert_eq!(bus.peek(0x0401), 0x01);
    }

    #[test]
    fn full_address_space_fits() {
        let mut bus = SimpleBus::new();
        let data = vec![0xEA; MEMORY_SIZE];
        assert!(load(&mut bus, 0x0000, &data).is_ok());
    }

    #[test]
    fn rejects_overflowing_image() {
        let mut bus = SimpleBus::new();
        let err = load(&mut bus, 0xFFFF, &[1, 2]).expect_err("too large");
        assert_eq!(
            err,
            ImageError::TooLarge {
                len: 2,
                origin: 0xFFFF
            }
        );
        assert_eq!(
            err.to_string(),
            "image of 2 bytes does not fit at $FFFF (room for 1)"
        );
        assert_eq!(bus.peek(0xFFFF), 0, "nothing written");
    }

    #[test]
    fn rejects_empty_image() {
        let mut bus = SimpleBus::new();
        assert_eq!(load(&mut bus, 0, &[]), Err(ImageError::Empty));
    }
}
