use core::time::Duration;

use crate::types::*;

pub const ADDRESS_GENERAL_CALL: u8 = 0x00;
pub const COMMAND_GENERAL_CALL_RESET: u8 = 0b00000110;
pub const COMMAND_GENERAL_CALL_WAKE_UP: u8 = 0b00001001;
pub const COMMAND_WRITE_DAC_REGISTER: u8 = 0b01000000;
pub const COMMAND_WRITE_DAC_REGISTER_AND_EEPROM: u8 = 0b01100000;

const MAX_VALUE: u16 = 0x0fff;

// || 0 0 PD PD D D D D || D D D D D D D D ||
pub fn encode_fast_write<E>(mode: PowerDownMode, value: u16) -> Result<[u8; 2], Error<E>> {
    if value > MAX_VALUE {
        return Err(Error::ValueOutOfBounds(value));
    }
    let [hi, lo] = value.to_be_bytes();
    Ok([(mode as u8) << 4 | hi, lo])
}

// || C C C x x PD PD x || D D D D D D D D || D D D D x x x x ||
pub fn encode_register_write<E>(
    command: u8,
    mode: PowerDownMode,
    value: u16,
) -> Result<[u8; 3], Error<E>> {
    if value > MAX_VALUE {
        return Err(Error::ValueOutOfBounds(value));
    }
    let [hi, lo] = (value << 4).to_be_bytes();
    Ok([command | (mode as u8) << 1, hi, lo])
}

// || RDY POR x x x PD PD x || D11..D4 || D3..D0 x x x x || x PD PD x D11..D8 || D7..D0 ||
pub fn parse_bytes(bytes: &[u8; 5]) -> Option<Registers> {
    Some(Registers {
        ready_state: ReadyState::try_from((bytes[0] & 0b10000000) >> 7).ok()?,
        power_state: PowerState::try_from((bytes[0] & 0b01000000) >> 6).ok()?,
        dac: DacState {
            power_down_mode: PowerDownMode::try_from((bytes[0] & 0b00000110) >> 1).ok()?,
            value: u16::from_be_bytes([bytes[1], bytes[2]]) >> 4,
        },
        eeprom: DacState {
            power_down_mode: PowerDownMode::try_from((bytes[3] & 0b01100000) >> 5).ok()?,
            value: u16::from_be_bytes([bytes[3] & 0b00001111, bytes[4]]),
        },
    })
}

/// Splits `duration` into nanosecond chunks that each fit a single `DelayNs::delay_ns` call.
pub fn delay_chunks(duration: Duration) -> impl Iterator<Item = u32> {
    let mut remaining = duration.as_nanos();
    core::iter::from_fn(move || {
        if remaining == 0 {
            return None;
        }
        let chunk = remaining.min(u32::MAX as u128) as u32;
        remaining -= chunk as u128;
        Some(chunk)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_chunks_split_long_delays() {
        assert_eq!(delay_chunks(Duration::ZERO).count(), 0);
        assert_eq!(
            delay_chunks(Duration::from_millis(250)).collect::<Vec<_>>(),
            vec![250_000_000]
        );
        // 10s does not fit in a u32 of nanoseconds.
        let chunks: Vec<u32> = delay_chunks(Duration::from_secs(10)).collect();
        assert_eq!(chunks, vec![u32::MAX, u32::MAX, 1_410_065_410]);
        assert_eq!(chunks.iter().map(|&c| c as u64).sum::<u64>(), 10_000_000_000);
    }

    #[test]
    fn register_write_layout() {
        assert_eq!(
            encode_register_write::<()>(
                COMMAND_WRITE_DAC_REGISTER,
                PowerDownMode::PowerDownFiveHundredK,
                0x0abc
            ),
            Ok([0b01000110, 0xab, 0xc0])
        );
        assert_eq!(
            encode_register_write::<()>(COMMAND_WRITE_DAC_REGISTER, PowerDownMode::Normal, 0x1000),
            Err(Error::ValueOutOfBounds(0x1000))
        );
    }
}
