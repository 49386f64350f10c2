//! Exercises the native call path against fake D2XX entry points installed
//! through a symbol lookup, so no vendor library is needed.

use d2xx::backend::Driver;
use d2xx::backend::dynamic::DynamicDriver;
use d2xx::ffi::{Api, Dword, FtDevice, FtHandle, FtStatus, LoadError, SYMBOLS};
use d2xx::{Eeprom, Handle, Status, Version};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::{c_char, c_int, c_void};

const HANDLE: usize = 0x1000;

struct Native {
    open: (usize, FtStatus),
    calls: Vec<&'static str>,
    closed: Vec<usize>,
    eeprom_types: Vec<u32>,
    eeprom_buffers: Vec<(bool, Dword)>,
    eeprom_results: VecDeque<FtStatus>,
    programmed: Option<(bool, Dword, [String; 4])>,
    ua: Vec<u8>,
    rx: Vec<u8>,
}

impl Default for Native {
    fn default() -> Self {
        Self {
            open: (HANDLE, 0),
            calls: Vec::new(),
            closed: Vec::new(),
            eeprom_types: Vec::new(),
            eeprom_buffers: Vec::new(),
            eeprom_results: VecDeque::new(),
            programmed: None,
            ua: Vec::new(),
            rx: Vec::new(),
        }
    }
}

thread_local! {
    static NATIVE: RefCell<Native> = RefCell::new(Native::default());
}

fn native<R>(f: impl FnOnce(&mut Native) -> R) -> R {
    NATIVE.with(|n| f(&mut n.borrow_mut()))
}

fn called(name: &'static str) {
    native(|n| n.calls.push(name));
}

unsafe fn put_str(dst: *mut c_char, s: &str) {
    for (i, b) in s.bytes().enumerate() {
        unsafe { *dst.add(i) = b as c_char };
    }
    unsafe { *dst.add(s.len()) = 0 };
}

unsafe fn get_str(src: *const c_char) -> String {
    unsafe { std::ffi::CStr::from_ptr(src) }
        .to_string_lossy()
        .into_owned()
}

extern "system" fn ft_open(_index: c_int, h: *mut FtHandle) -> FtStatus {
    called("FT_Open");
    let (raw, status) = native(|n| n.open);
    unsafe { *h = raw as FtHandle };
    status
}

extern "system" fn ft_close(h: FtHandle) -> FtStatus {
    called("FT_Close");
    native(|n| n.closed.push(h as usize));
    0
}

extern "system" fn ft_create_device_info_list(num: *mut Dword) -> FtStatus {
    unsafe { *num = 2 };
    0
}

extern "system" fn ft_get_library_version(v: *mut Dword) -> FtStatus {
    unsafe { *v = 0x0001_0418 };
    0
}

extern "system" fn ft_get_device_info(
    _h: FtHandle,
    dev: *mut FtDevice,
    id: *mut Dword,
    _serial: *mut c_char,
    _desc: *mut c_char,
    _dummy: *mut c_void,
) -> FtStatus {
    unsafe {
        *dev = 8;
        *id = 0x0403_6014;
    }
    0
}

extern "system" fn ft_eeprom_read(
    _h: FtHandle,
    data: *mut c_void,
    len: Dword,
    manufacturer: *mut c_char,
    manufacturer_id: *mut c_char,
    desc: *mut c_char,
    serial: *mut c_char,
) -> FtStatus {
    called("FT_EEPROM_Read");
    let raw: &mut [u8] = if data.is_null() {
        &mut []
    } else {
        unsafe { std::slice::from_raw_parts_mut(data.cast::<u8>(), len as usize) }
    };
    let status = native(|n| {
        n.eeprom_buffers.push((data.is_null(), len));
        if let Some(tag) = raw.first_chunk::<4>() {
            n.eeprom_types.push(u32::from_le_bytes(*tag));
        }
        n.eeprom_results.pop_front().unwrap_or(0)
    });
    if status == 0 {
        if let Some(body) = raw.get_mut(4..) {
            body.fill(0xAB);
        }
        unsafe {
            put_str(manufacturer, "FTDI");
            put_str(manufacturer_id, "FT");
            put_str(desc, "Single RS232-HS");
            put_str(serial, "FT1234");
        }
    }
    status
}

extern "system" fn ft_eeprom_program(
    _h: FtHandle,
    data: *mut c_void,
    len: Dword,
    manufacturer: *mut c_char,
    manufacturer_id: *mut c_char,
    desc: *mut c_char,
    serial: *mut c_char,
) -> FtStatus {
    let strings = unsafe {
        [
            get_str(manufacturer),
            get_str(manufacturer_id),
            get_str(desc),
            get_str(serial),
        ]
    };
    native(|n| n.programmed = Some((data.is_null(), len, strings)));
    0
}

extern "system" fn ft_handle_only(_h: FtHandle) -> FtStatus {
    called("handle_only");
    0
}

extern "system" fn ft_write_ee(_h: FtHandle, _offset: Dword, _value: u16) -> FtStatus {
    0
}

extern "system" fn ft_ee_ua_size(_h: FtHandle, size: *mut Dword) -> FtStatus {
    let len = native(|n| n.ua.len());
    unsafe { *size = len as Dword };
    0
}

extern "system" fn ft_ee_ua_read(_h: FtHandle, data: *mut u8, len: Dword, read: *mut Dword) -> FtStatus {
    native(|n| {
        let count = n.ua.len().min(len as usize);
        unsafe {
            std::ptr::copy_nonoverlapping(n.ua.as_ptr(), data, count);
            *read = count as Dword;
        }
    });
    0
}

extern "system" fn ft_ee_ua_write(_h: FtHandle, data: *mut u8, len: Dword) -> FtStatus {
    let ua = unsafe { std::slice::from_raw_parts(data, len as usize) }.to_vec();
    native(|n| n.ua = ua);
    0
}

extern "system" fn ft_get_bit_mode(_h: FtHandle, mode: *mut u8) -> FtStatus {
    unsafe { *mode = 0x40 };
    0
}

extern "system" fn ft_two_bytes(_h: FtHandle, _a: u8, _b: u8) -> FtStatus {
    0
}

extern "system" fn ft_set_chars(_h: FtHandle, _a: u8, _b: u8, _c: u8, _d: u8) -> FtStatus {
    0
}

extern "system" fn ft_set_flow_control(_h: FtHandle, flow: u16, _xon: u8, _xoff: u8) -> FtStatus {
    if flow == 0x0100 { 0 } else { 6 }
}

extern "system" fn ft_one_byte(_h: FtHandle, _v: u8) -> FtStatus {
    0
}

extern "system" fn ft_one_word(_h: FtHandle, baud: u32) -> FtStatus {
    if baud == 0 { 7 } else { 0 }
}

extern "system" fn ft_two_words(_h: FtHandle, _a: u32, _b: u32) -> FtStatus {
    0
}

extern "system" fn ft_get_queue_status(_h: FtHandle, pending: *mut Dword) -> FtStatus {
    let len = native(|n| n.rx.len());
    unsafe { *pending = len as Dword };
    0
}

extern "system" fn ft_read(_h: FtHandle, buf: *mut c_void, len: Dword, read: *mut Dword) -> FtStatus {
    native(|n| {
        let count = n.rx.len().min(len as usize);
        let chunk: Vec<u8> = n.rx.drain(..count).collect();
        unsafe {
            std::ptr::copy_nonoverlapping(chunk.as_ptr(), buf.cast::<u8>(), count);
            *read = count as Dword;
        }
    });
    0
}

extern "system" fn ft_write(_h: FtHandle, _buf: *mut c_void, len: Dword, sent: *mut Dword) -> FtStatus {
    unsafe { *sent = len };
    0
}

fn lookup(name: &'static str) -> Option<*const c_void> {
    let f: *const c_void = match name {
        "FT_Close" => ft_close as *const c_void,
        "FT_CreateDeviceInfoList" => ft_create_device_info_list as *const c_void,
        "FT_EEPROM_Read" => ft_eeprom_read as *const c_void,
        "FT_EEPROM_Program" => ft_eeprom_program as *const c_void,
        "FT_EraseEE" | "FT_ResetDevice" => ft_handle_only as *const c_void,
        "FT_WriteEE" => ft_write_ee as *const c_void,
        "FT_EE_UASize" => ft_ee_ua_size as *const c_void,
        "FT_EE_UARead" => ft_ee_ua_read as *const c_void,
        "FT_EE_UAWrite" => ft_ee_ua_write as *const c_void,
        "FT_GetBitMode" => ft_get_bit_mode as *const c_void,
        "FT_GetDeviceInfo" => ft_get_device_info as *const c_void,
        "FT_GetLibraryVersion" => ft_get_library_version as *const c_void,
        "FT_GetQueueStatus" => ft_get_queue_status as *const c_void,
        "FT_Open" => ft_open as *const c_void,
        "FT_Read" => ft_read as *const c_void,
        "FT_SetBaudRate" => ft_one_word as *const c_void,
        "FT_SetBitMode" => ft_two_bytes as *const c_void,
        "FT_SetChars" => ft_set_chars as *const c_void,
        "FT_SetFlowControl" => ft_set_flow_control as *const c_void,
        "FT_SetLatencyTimer" => ft_one_byte as *const c_void,
        "FT_SetTimeouts" | "FT_SetUSBParameters" => ft_two_words as *const c_void,
        "FT_Write" => ft_write as *const c_void,
        _ => return None,
    };
    Some(f)
}

fn fake_driver() -> DynamicDriver {
    // SAFETY: every fake has the signature of the symbol it stands for.
    unsafe { DynamicDriver::from_lookup(lookup) }
}

#[test]
fn lookup_covers_every_required_symbol() {
    assert_eq!(SYMBOLS.len(), 24);
    for name in SYMBOLS {
        assert!(lookup(name).is_some(), "{name} not faked");
    }
}

#[test]
fn discovery_goes_through_the_table() {
    let driver = fake_driver();
    assert!(driver.available());
    assert_eq!(
        driver.version(),
        Version {
            major: 1,
            minor: 4,
            build: 24
        }
    );
    assert_eq!(driver.version().to_string(), "1.4.24");
    assert_eq!(driver.create_device_info_list(), Ok(2));
}

#[test_log::test]
fn one_missing_symbol_disables_everything() {
    // SAFETY: same fakes as `fake_driver`, minus one.
    let driver = unsafe {
        DynamicDriver::from_lookup(|name| if name == "FT_SetBitMode" { None } else { lookup(name) })
    };
    assert!(!driver.available());
    assert_eq!(driver.version(), Version::default());
    assert_eq!(driver.create_device_info_list(), Err(Status::MISSING));
    assert_eq!(driver.open(0).err(), Some(Status::MISSING));
    assert!(native(|n| n.calls.is_empty()));
}

#[test]
fn null_addresses_count_as_missing() {
    // SAFETY: no address is ever called.
    let result = unsafe {
        Api::resolve(|name| match name {
            "FT_Read" | "FT_Write" => Some(std::ptr::null()),
            _ => lookup(name),
        })
    };
    match result {
        Err(LoadError::MissingSymbols(names)) => assert_eq!(names, vec!["FT_Read", "FT_Write"]),
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("resolved with null entry points"),
    }
}

#[test]
fn missing_library_fails_to_load() {
    let result = DynamicDriver::load_from("/nonexistent/libftd2xx-test.so");
    assert!(matches!(result, Err(LoadError::Library(_))));
}

#[test]
fn null_handle_with_success_is_other_error() {
    native(|n| n.open = (0, 0));
    let driver = fake_driver();
    assert_eq!(driver.open(0).err(), Some(Status::OTHER_ERROR));
}

#[test]
fn open_failure_is_surfaced() {
    native(|n| n.open = (0, 2));
    let driver = fake_driver();
    assert_eq!(driver.open(3).err(), Some(Status::DEVICE_NOT_FOUND));
}

#[test]
fn out_of_range_driver_status_is_not_synthetic() {
    native(|n| n.open = (0, u32::MAX));
    let driver = fake_driver();
    let status = driver.open(0).err().expect("open fails");
    assert_ne!(status, Status::MISSING);
    assert_eq!(status.code(), 0xFFFF_FFFF);
}

#[test]
fn device_info_is_unpacked() {
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    let info = h.get_device_info().expect("info");
    assert_eq!(info.device_type, 8);
    assert_eq!(info.vendor_id, 0x0403);
    assert_eq!(info.product_id, 0x6014);
}

#[test_log::test]
fn eeprom_read_retries_with_zero_device_type() {
    native(|n| n.eeprom_results.push_back(6));
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    let mut ee = Eeprom::with_len(56);
    assert_eq!(h.eeprom_read(5, &mut ee), Ok(()));
    assert_eq!(native(|n| n.eeprom_types.clone()), vec![5, 0]);
    assert_eq!(ee.manufacturer, "FTDI");
    assert_eq!(ee.manufacturer_id, "FT");
    assert_eq!(ee.desc, "Single RS232-HS");
    assert_eq!(ee.serial, "FT1234");
    assert!(ee.raw[4..].iter().all(|&b| b == 0xAB));
}

#[test]
fn eeprom_read_keeps_device_type_when_accepted() {
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    let mut ee = Eeprom::with_len(56);
    assert_eq!(h.eeprom_read(5, &mut ee), Ok(()));
    assert_eq!(native(|n| n.eeprom_types.clone()), vec![5]);
    assert_eq!(ee.header().map(|hdr| hdr.device_type), Some(5));
}

#[test]
fn eeprom_read_retries_only_once() {
    native(|n| n.eeprom_results.extend([6, 6]));
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    let mut ee = Eeprom::with_len(56);
    assert_eq!(h.eeprom_read(5, &mut ee), Err(Status::INVALID_PARAMETER));
    assert_eq!(native(|n| n.eeprom_types.len()), 2);
    assert!(ee.manufacturer.is_empty());
}

#[test]
fn eeprom_read_other_failures_are_not_retried() {
    native(|n| n.eeprom_results.push_back(11));
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    let mut ee = Eeprom::with_len(56);
    assert_eq!(h.eeprom_read(5, &mut ee), Err(Status::EEPROM_READ_FAILED));
    assert_eq!(native(|n| n.eeprom_types.len()), 1);
}

#[test]
fn eeprom_read_without_raw_passes_null() {
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    let mut ee = Eeprom::with_len(0);
    assert_eq!(h.eeprom_read(5, &mut ee), Ok(()));
    assert_eq!(native(|n| n.eeprom_buffers.clone()), vec![(true, 0)]);
    assert!(native(|n| n.eeprom_types.is_empty()));
    assert!(ee.raw.is_empty());
    assert_eq!(ee.manufacturer, "FTDI");
    assert_eq!(ee.serial, "FT1234");
}

#[test]
fn eeprom_read_short_raw_skips_the_header() {
    native(|n| n.eeprom_results.push_back(6));
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    let mut ee = Eeprom::with_len(8);
    assert_eq!(h.eeprom_read(5, &mut ee), Ok(()));
    // Too short for a header, so neither attempt carries a device type.
    assert_eq!(native(|n| n.eeprom_types.clone()), vec![0, 0]);
    assert_eq!(native(|n| n.eeprom_buffers.clone()), vec![(false, 8), (false, 8)]);
    assert_eq!(ee.header(), None);
    assert_eq!(ee.raw[..4], [0; 4]);
    assert!(ee.raw[4..].iter().all(|&b| b == 0xAB));
}

#[test]
fn eeprom_program_short_raw_is_passed_as_is() {
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    let ee = Eeprom {
        raw: vec![1, 2, 3],
        manufacturer: "FTDI".into(),
        ..Eeprom::default()
    };
    assert_eq!(h.eeprom_program(&ee), Ok(()));
    let (null, len, strings) = native(|n| n.programmed.take()).expect("programmed");
    assert!(!null);
    assert_eq!(len, 3);
    assert_eq!(strings[0], "FTDI");
    assert_eq!(strings[2], "");
}

#[test]
fn eeprom_program_passes_fixed_strings() {
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    let ee = Eeprom {
        raw: vec![0; 56],
        manufacturer: "FTDI".into(),
        manufacturer_id: "FT".into(),
        desc: "x".repeat(80),
        serial: "S1".into(),
    };
    assert_eq!(h.eeprom_program(&ee), Ok(()));
    let (null, len, strings) = native(|n| n.programmed.take()).expect("programmed");
    assert!(!null);
    assert_eq!(len, 56);
    assert_eq!(strings[0], "FTDI");
    assert_eq!(strings[1], "FT");
    assert_eq!(strings[2].len(), 63);
    assert_eq!(strings[3], "S1");
}

#[test]
fn eeprom_program_empty_raw_passes_null() {
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    assert_eq!(h.eeprom_program(&Eeprom::default()), Ok(()));
    let (null, len, _) = native(|n| n.programmed.take()).expect("programmed");
    assert!(null);
    assert_eq!(len, 0);
}

#[test]
fn ee_ua_read_short_transfer_is_invalid_parameter() {
    native(|n| n.ua = vec![1, 2, 3]);
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    assert_eq!(h.ee_ua_size(), Ok(3));

    let mut ua = [0u8; 3];
    assert_eq!(h.ee_ua_read(&mut ua), Ok(()));
    assert_eq!(ua, [1, 2, 3]);

    let mut too_long = [0u8; 5];
    assert_eq!(h.ee_ua_read(&mut too_long), Err(Status::INVALID_PARAMETER));

    assert_eq!(h.ee_ua_write(&[9, 8]), Ok(()));
    assert_eq!(native(|n| n.ua.clone()), vec![9, 8]);
}

#[test]
fn line_settings_pass_through() {
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    assert_eq!(h.set_baud_rate(115_200), Ok(()));
    assert_eq!(h.set_baud_rate(0), Err(Status::INVALID_BAUD_RATE));
    assert_eq!(h.set_flow_control(), Ok(()));
    assert_eq!(h.set_chars(b'\n', true, 0, false), Ok(()));
    assert_eq!(h.set_usb_parameters(64, 64), Ok(()));
    assert_eq!(h.set_timeouts(100, 100), Ok(()));
    assert_eq!(h.set_latency_timer(2), Ok(()));
    assert_eq!(h.set_bit_mode(0xFF, 0x40), Ok(()));
    assert_eq!(h.get_bit_mode(), Ok(0x40));
    assert_eq!(h.write_ee(1, 0xBEEF), Ok(()));
    assert_eq!(h.erase_ee(), Ok(()));
    assert_eq!(h.reset_device(), Ok(()));
}

#[test]
fn data_transfer() {
    native(|n| n.rx = vec![1, 2, 3, 4]);
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    assert_eq!(h.get_queue_status(), Ok(4));
    let mut buf = [0u8; 3];
    assert_eq!(h.read(&mut buf), Ok(3));
    assert_eq!(buf, [1, 2, 3]);
    assert_eq!(h.read(&mut []), Ok(0));
    assert_eq!(h.write(b"hello"), Ok(5));
}

#[test]
fn closed_session_never_reaches_the_driver() {
    let driver = fake_driver();
    let mut h = driver.open(0).expect("open");
    assert_eq!(h.close(), Ok(()));
    native(|n| n.calls.clear());

    assert_eq!(h.close(), Err(Status::INVALID_HANDLE));
    assert_eq!(h.reset_device(), Err(Status::INVALID_HANDLE));
    assert_eq!(h.read(&mut [0u8; 4]), Err(Status::INVALID_HANDLE));
    assert_eq!(h.get_queue_status(), Err(Status::INVALID_HANDLE));
    drop(h);

    assert!(native(|n| n.calls.is_empty()));
    assert_eq!(native(|n| n.closed.clone()), vec![HANDLE]);
}

#[test_log::test]
fn dropping_an_open_session_closes_it() {
    let driver = fake_driver();
    let h = driver.open(0).expect("open");
    drop(h);
    assert_eq!(native(|n| n.closed.clone()), vec![HANDLE]);
}
