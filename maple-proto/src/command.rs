//! Bus command bytes.

/// Command byte carried in the top byte of every frame word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    DeviceInfoRequest = 0x01,
    ExtDeviceInfoRequest = 0x02,
    Reset = 0x03,
    Shutdown = 0x04,
    ResponseDeviceInfo = 0x05,
    ResponseExtDeviceInfo = 0x06,
    ResponseAck = 0x07,
    ResponseDataXfer = 0x08,
    GetCondition = 0x09,
    GetMemoryInformation = 0x0A,
    BlockRead = 0x0B,
    BlockWrite = 0x0C,
    SetCondition = 0x0E,
    ResponseFileError = 0xFB,
    ResponseRequestResend = 0xFC,
    ResponseUnknownCommand = 0xFD,
    ResponseFunctionCodeNotSupported = 0xFE,
    ResponseNone = 0xFF,
}

impl Command {
    /// Map a raw command byte back to a known command.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x01 => Self::DeviceInfoRequest,
            0x02 => Self::ExtDeviceInfoRequest,
            0x03 => Self::Reset,
            0x04 => Self::Shutdown,
            0x05 => Self::ResponseDeviceInfo,
            0x06 => Self::ResponseExtDeviceInfo,
            0x07 => Self::ResponseAck,
            0x08 => Self::ResponseDataXfer,
            0x09 => Self::GetCondition,
            0x0A => Self::GetMemoryInformation,
            0x0B => Self::BlockRead,
            0x0C => Self::BlockWrite,
            0x0E => Self::SetCondition,
            0xFB => Self::ResponseFileError,
            0xFC => Self::ResponseRequestResend,
            0xFD => Self::ResponseUnknownCommand,
            0xFE => Self::ResponseFunctionCodeNotSupported,
            0xFF => Self::ResponseNone,
            _ => return None,
        })
    }

    /// The raw command byte.
    #[inline]
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// True for the error responses a peripheral may send instead of data.
    #[must_use]
    pub const fn is_error_response(self) -> bool {
        matches!(
            self,
            Self::ResponseFileError
                | Self::ResponseRequestResend
                | Self::ResponseUnknownCommand
                | Self::ResponseFunctionCodeNotSupported
                | Self::ResponseNone
        )
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> Self {
        cmd.byte()
    }
}
