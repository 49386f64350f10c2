//! Native D2XX types and the typed table of driver entry points.
//!
//! Both the linked and the dynamically loaded backends produce an [`Api`];
//! everything above this module only ever calls through one.

use libc::{c_char, c_int, c_void};
use thiserror::Error;

pub type FtHandle = *mut c_void;
pub type FtStatus = u32;
pub type FtDevice = u32;
pub type Dword = u32;

/// `FT_FLOW_RTS_CTS`
pub const FLOW_RTS_CTS: u16 = 0x0100;

/// Why a driver library could not be turned into an [`Api`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load d2xx library: {0}")]
    Library(#[from] libloading::Error),
    #[error("d2xx library lacks entry points: {}", .0.join(", "))]
    MissingSymbols(Vec<&'static str>),
}

macro_rules! api {
    ($($field:ident = $symbol:literal: fn($($arg:ty),*);)*) => {
        /// Typed D2XX entry points, one per exported symbol.
        #[derive(Clone, Copy)]
        pub struct Api {
            $(pub $field: unsafe extern "system" fn($($arg),*) -> FtStatus,)*
        }

        /// Exported names of every entry point an [`Api`] requires.
        pub const SYMBOLS: &[&str] = &[$($symbol),*];

        impl Api {
            /// Builds the table by looking up every symbol individually.
            ///
            /// Fails listing every missing name if any lookup returns `None`
            /// or a null address.
            ///
            /// # Safety
            ///
            /// Each address returned by `lookup` must point to a function with
            /// the D2XX signature of the requested symbol, and must remain
            /// valid for as long as the returned table is used.
            pub unsafe fn resolve<F>(mut lookup: F) -> Result<Self, LoadError>
            where
                F: FnMut(&'static str) -> Option<*const c_void>,
            {
                $(let $field = lookup($symbol).filter(|addr| !addr.is_null());)*
                match ($($field,)*) {
                    ($(Some($field),)*) => Ok(Self {
                        // SAFETY: the caller guarantees each address has the
                        // signature declared for its symbol.
                        $($field: unsafe {
                            std::mem::transmute::<
                                *const c_void,
                                unsafe extern "system" fn($($arg),*) -> FtStatus,
                            >($field)
                        },)*
                    }),
                    ($($field,)*) => {
                        let found = [$(($symbol, $field.is_some())),*];
                        let missing = found
                            .iter()
                            .filter(|(_, ok)| !ok)
                            .map(|(name, _)| *name)
                            .collect();
                        Err(LoadError::MissingSymbols(missing))
                    }
                }
            }
        }
    };
}

api! {
    close = "FT_Close": fn(FtHandle);
    create_device_info_list = "FT_CreateDeviceInfoList": fn(*mut Dword);
    eeprom_read = "FT_EEPROM_Read":
        fn(FtHandle, *mut c_void, Dword, *mut c_char, *mut c_char, *mut c_char, *mut c_char);
    eeprom_program = "FT_EEPROM_Program":
        fn(FtHandle, *mut c_void, Dword, *mut c_char, *mut c_char, *mut c_char, *mut c_char);
    erase_ee = "FT_EraseEE": fn(FtHandle);
    write_ee = "FT_WriteEE": fn(FtHandle, Dword, u16);
    ee_ua_size = "FT_EE_UASize": fn(FtHandle, *mut Dword);
    ee_ua_read = "FT_EE_UARead": fn(FtHandle, *mut u8, Dword, *mut Dword);
    ee_ua_write = "FT_EE_UAWrite": fn(FtHandle, *mut u8, Dword);
    get_bit_mode = "FT_GetBitMode": fn(FtHandle, *mut u8);
    get_device_info = "FT_GetDeviceInfo":
        fn(FtHandle, *mut FtDevice, *mut Dword, *mut c_char, *mut c_char, *mut c_void);
    get_library_version = "FT_GetLibraryVersion": fn(*mut Dword);
    get_queue_status = "FT_GetQueueStatus": fn(FtHandle, *mut Dword);
    open = "FT_Open": fn(c_int, *mut FtHandle);
    read = "FT_Read": fn(FtHandle, *mut c_void, Dword, *mut Dword);
    reset_device = "FT_ResetDevice": fn(FtHandle);
    set_baud_rate = "FT_SetBaudRate": fn(FtHandle, u32);
    set_bit_mode = "FT_SetBitMode": fn(FtHandle, u8, u8);
    set_chars = "FT_SetChars": fn(FtHandle, u8, u8, u8, u8);
    set_flow_control = "FT_SetFlowControl": fn(FtHandle, u16, u8, u8);
    set_latency_timer = "FT_SetLatencyTimer": fn(FtHandle, u8);
    set_timeouts = "FT_SetTimeouts": fn(FtHandle, u32, u32);
    set_usb_parameters = "FT_SetUSBParameters": fn(FtHandle, u32, u32);
    write = "FT_Write": fn(FtHandle, *mut c_void, Dword, *mut Dword);
}
