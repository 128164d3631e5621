use super::{AccelRange, GyroRange, ImuChip};
use crate::bus::i2c::I2CBus;
use crate::bus::RegisterBus;
use crate::errors::{SensorError, SensorResult};
use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

// ICM-20948 user bank 0
const WHO_AM_I: u8 = 0x00;
const USER_CTRL: u8 = 0x03;
const PWR_MGMT_1: u8 = 0x06;
const PWR_MGMT_2: u8 = 0x07;
const INT_PIN_CFG: u8 = 0x0F;
const ACCEL_XOUT_H: u8 = 0x2D;

// ICM-20948 user bank 2
const GYRO_CONFIG_1: u8 = 0x01;
const ACCEL_CONFIG: u8 = 0x14;

// Present in every bank
const REG_BANK_SEL: u8 = 0x7F;

const WHOAMI_ICM20948: u8 = 0xEA;

const PWR_DEVICE_RESET: u8 = 0x80;
const PWR_CLKSEL_AUTO: u8 = 0x01;
const INT_BYPASS_EN: u8 = 0x02;
const FCHOICE_DLPF: u8 = 0x01;

// AK09916 magnetometer, reachable directly once bypass is enabled
const AK09916_ADDRESS: u8 = 0x0C;
const AK_WIA2: u8 = 0x01;
const AK_HXL: u8 = 0x11;
const AK_CNTL2: u8 = 0x31;
const AK_CNTL3: u8 = 0x32;

const WHOAMI_AK09916: u8 = 0x09;
const AK_MODE_CONTINUOUS_100HZ: u8 = 0x08;
const AK_SOFT_RESET: u8 = 0x01;
const AK_ST2_HOFL: u8 = 0x08;

const MAG_UT_PER_LSB: f64 = 0.15;
const STANDARD_GRAVITY: f64 = 9.80665; // m/s^2

/// Length of the accel+gyro burst (ACCEL_XOUT_H..GYRO_ZOUT_L)
pub const ACCEL_GYRO_LEN: usize = 12;
/// Length of the magnetometer burst (HXL..ST2); reading ST2 releases the data latch
pub const MAG_LEN: usize = 8;

/// ICM-20948 9-axis IMU, by default on a Linux I2C bus
pub struct Icm20948<B = I2CBus> {
    id: String,
    address: u8,
    bus: B,
    accel_range: AccelRange,
    gyro_range: GyroRange,
}

impl<B: RegisterBus> Icm20948<B> {
    pub fn new(id: String, bus: B, address: u8, accel_range: AccelRange, gyro_range: GyroRange) -> Self {
        Self {
            id,
            address,
            bus,
            accel_range,
            gyro_range,
        }
    }

    fn init_error(&self, step: &str, e: impl std::fmt::Display) -> SensorError {
        SensorError::InitError {
            sensor: self.id.clone(),
            reason: format!("{}: {}", step, e),
        }
    }

    async fn select_bank(&mut self, bank: u8) -> SensorResult<()> {
        self.write(REG_BANK_SEL, bank << 4, "Failed to select bank").await
    }

    async fn write(&mut self, reg: u8, value: u8, step: &str) -> SensorResult<()> {
        let address = self.address;
        self.bus
            .write_register(address, reg, value)
            .await
            .map_err(|e| self.init_error(step, e))
    }

    async fn write_mag(&mut self, reg: u8, value: u8, step: &str) -> SensorResult<()> {
        self.bus
            .write_register(AK09916_ADDRESS, reg, value)
            .await
            .map_err(|e| self.init_error(step, e))
    }

    /// Verify identity, reset, configure ranges and bring up the magnetometer
    pub async fn init(&mut self) -> SensorResult<()> {
        self.select_bank(0).await?;

        let mut who_am_i = [0u8; 1];
        self.bus.read_registers(self.address, WHO_AM_I, &mut who_am_i).await?;
        if who_am_i[0] != WHOAMI_ICM20948 {
            return Err(SensorError::WrongChipId {
                sensor: self.id.clone(),
                expected: WHOAMI_ICM20948,
                actual: who_am_i[0],
            });
        }

        self.write(PWR_MGMT_1, PWR_DEVICE_RESET, "Failed to reset device").await?;
        sleep(Duration::from_millis(100)).await;
        // Reset returns the bank selector to 0
        self.write(PWR_MGMT_1, PWR_CLKSEL_AUTO, "Failed to wake device").await?;
        sleep(Duration::from_millis(20)).await;
        self.write(PWR_MGMT_2, 0x00, "Failed to enable accel/gyro").await?;

        self.select_bank(2).await?;
        let gyro_cfg = (self.gyro_range.fs_sel() << 1) | FCHOICE_DLPF;
        self.write(GYRO_CONFIG_1, gyro_cfg, "Failed to configure gyroscope").await?;
        let accel_cfg = (self.accel_range.fs_sel() << 1) | FCHOICE_DLPF;
        self.write(ACCEL_CONFIG, accel_cfg, "Failed to configure accelerometer").await?;
        self.select_bank(0).await?;

        // Internal I2C master off, bypass on: the AK09916 shows up on the host bus
        self.write(USER_CTRL, 0x00, "Failed to disable I2C master").await?;
        self.write(INT_PIN_CFG, INT_BYPASS_EN, "Failed to enable I2C bypass").await?;
        sleep(Duration::from_millis(10)).await;

        let mut wia2 = [0u8; 1];
        self.bus.read_registers(AK09916_ADDRESS, AK_WIA2, &mut wia2).await?;
        if wia2[0] != WHOAMI_AK09916 {
            return Err(SensorError::WrongChipId {
                sensor: format!("{}/ak09916", self.id),
                expected: WHOAMI_AK09916,
                actual: wia2[0],
            });
        }

        self.write_mag(AK_CNTL3, AK_SOFT_RESET, "Failed to reset magnetometer").await?;
        sleep(Duration::from_millis(10)).await;
        self.write_mag(AK_CNTL2, AK_MODE_CONTINUOUS_100HZ, "Failed to start magnetometer").await?;

        info!(
            "[{}] ICM-20948 ready on {} at {:#04x} ({:?}, {:?})",
            self.id,
            self.bus.path(),
            self.address,
            self.accel_range,
            self.gyro_range
        );
        Ok(())
    }
}

#[async_trait]
impl<B: RegisterBus> ImuChip for Icm20948<B> {
    async fn read_accel_gyro(&mut self) -> SensorResult<[f64; 6]> {
        let mut buf = [0u8; ACCEL_GYRO_LEN];
        self.bus.read_registers(self.address, ACCEL_XOUT_H, &mut buf).await?;
        let sample = decode_accel_gyro(&buf, self.accel_range, self.gyro_range);
        debug!("[{}] accel/gyro sample {:?}", self.id, sample);
        Ok(sample)
    }

    async fn read_magnetometer(&mut self) -> SensorResult<[f64; 3]> {
        let mut buf = [0u8; MAG_LEN];
        self.bus.read_registers(AK09916_ADDRESS, AK_HXL, &mut buf).await?;
        let field = decode_magnetometer(&self.id, &buf)?;
        debug!("[{}] magnetometer sample {:?}", self.id, field);
        Ok(field)
    }
}

/// Big-endian accel triple followed by gyro triple, returned gyro-first
pub fn decode_accel_gyro(buf: &[u8; ACCEL_GYRO_LEN], accel: AccelRange, gyro: GyroRange) -> [f64; 6] {
    let raw = |i: usize| i16::from_be_bytes([buf[2 * i], buf[2 * i + 1]]) as f64;
    let a = |i: usize| raw(i) / accel.lsb_per_g() * STANDARD_GRAVITY;
    let g = |i: usize| raw(i) / gyro.lsb_per_dps();

    [g(3), g(4), g(5), a(0), a(1), a(2)]
}

/// Little-endian field triple; ST2 overflow flag invalidates the sample
pub fn decode_magnetometer(sensor: &str, buf: &[u8; MAG_LEN]) -> SensorResult<[f64; 3]> {
    let st2 = buf[7];
    if st2 & AK_ST2_HOFL != 0 {
        return Err(SensorError::DataError {
            sensor: sensor.to_string(),
            reason: "magnetometer overflow".to_string(),
        });
    }

    let raw = |i: usize| i16::from_le_bytes([buf[2 * i], buf[2 * i + 1]]) as f64;
    Ok([
        raw(0) * MAG_UT_PER_LSB,
        raw(1) * MAG_UT_PER_LSB,
        raw(2) * MAG_UT_PER_LSB,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::bus::i2c::I2CError;
    use std::collections::HashMap;

    const ADDRESS: u8 = 0x68;

    /// In-memory register map that records every write
    #[derive(Default)]
    struct FakeBus {
        registers: HashMap<(u8, u8), Vec<u8>>,
        writes: Vec<(u8, u8, u8)>,
        fail_writes_to: Option<(u8, u8)>,
        fail_reads: bool,
    }

    impl FakeBus {
        fn healthy() -> Self {
            let mut bus = FakeBus::default();
            bus.registers.insert((ADDRESS, WHO_AM_I), vec![WHOAMI_ICM20948]);
            bus.registers.insert((AK09916_ADDRESS, AK_WIA2), vec![WHOAMI_AK09916]);
            bus
        }

        fn io_error(what: &str) -> I2CError {
            I2CError::from(std::io::Error::new(std::io::ErrorKind::Other, what.to_string()))
        }
    }

    #[async_trait]
    impl RegisterBus for FakeBus {
        fn path(&self) -> &str {
            "fake"
        }

        async fn read_registers(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> Result<(), I2CError> {
            if self.fail_reads {
                return Err(Self::io_error("nack"));
            }
            let data = self.registers.get(&(address, reg)).cloned().unwrap_or_default();
            for (i, b) in buf.iter_mut().enumerate() {
                *b = data.get(i).copied().unwrap_or(0);
            }
            Ok(())
        }

        async fn write_register(&mut self, address: u8, reg: u8, value: u8) -> Result<(), I2CError> {
            if self.fail_writes_to == Some((address, reg)) {
                return Err(Self::io_error("nack"));
            }
            self.writes.push((address, reg, value));
            Ok(())
        }
    }

    fn chip(bus: FakeBus) -> Icm20948<FakeBus> {
        Icm20948::new("imu0".to_string(), bus, ADDRESS, AccelRange::G8, GyroRange::Dps1000)
    }

    #[tokio::test]
    async fn test_init_write_sequence() {
        let mut imu = chip(FakeBus::healthy());

        imu.init().await.unwrap();

        let writes = &imu.bus.writes;
        assert_eq!(writes.first(), Some(&(ADDRESS, REG_BANK_SEL, 0x00)));
        assert!(writes.contains(&(ADDRESS, PWR_MGMT_1, PWR_DEVICE_RESET)));

        let bank2 = writes.iter().position(|w| *w == (ADDRESS, REG_BANK_SEL, 0x20)).unwrap();
        assert_eq!(writes[bank2 + 1], (ADDRESS, GYRO_CONFIG_1, (2 << 1) | FCHOICE_DLPF));
        assert_eq!(writes[bank2 + 2], (ADDRESS, ACCEL_CONFIG, (2 << 1) | FCHOICE_DLPF));
        assert_eq!(writes[bank2 + 3], (ADDRESS, REG_BANK_SEL, 0x00));

        assert!(writes.contains(&(ADDRESS, INT_PIN_CFG, INT_BYPASS_EN)));
        assert_eq!(writes.last(), Some(&(AK09916_ADDRESS, AK_CNTL2, AK_MODE_CONTINUOUS_100HZ)));
    }

    #[tokio::test]
    async fn test_init_wrong_who_am_i() {
        let mut bus = FakeBus::healthy();
        bus.registers.insert((ADDRESS, WHO_AM_I), vec![0x47]);
        let mut imu = chip(bus);

        match imu.init().await.unwrap_err() {
            SensorError::WrongChipId { sensor, expected, actual } => {
                assert_eq!(sensor, "imu0");
                assert_eq!(expected, WHOAMI_ICM20948);
                assert_eq!(actual, 0x47);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!imu.bus.writes.iter().any(|w| w.1 == PWR_MGMT_1));
    }

    #[tokio::test]
    async fn test_init_wrong_magnetometer_id() {
        let mut bus = FakeBus::healthy();
        bus.registers.remove(&(AK09916_ADDRESS, AK_WIA2));
        let mut imu = chip(bus);

        match imu.init().await.unwrap_err() {
            SensorError::WrongChipId { sensor, expected, actual } => {
                assert_eq!(sensor, "imu0/ak09916");
                assert_eq!(expected, WHOAMI_AK09916);
                assert_eq!(actual, 0x00);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!imu.bus.writes.iter().any(|w| w.0 == AK09916_ADDRESS));
    }

    #[tokio::test]
    async fn test_init_bank_select_failure_is_init_error() {
        let mut bus = FakeBus::healthy();
        bus.fail_writes_to = Some((ADDRESS, REG_BANK_SEL));
        let mut imu = chip(bus);

        match imu.init().await.unwrap_err() {
            SensorError::InitError { sensor, reason } => {
                assert_eq!(sensor, "imu0");
                assert!(reason.starts_with("Failed to select bank"), "{}", reason);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_reads_use_one_burst_each() {
        let mut bus = FakeBus::healthy();
        // accel x = 4096 LSB (1 g at 8 g range), gyro z = 328 LSB (10 dps at 1000 dps range)
        bus.registers.insert(
            (ADDRESS, ACCEL_XOUT_H),
            vec![0x10, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0x48],
        );
        bus.registers.insert((AK09916_ADDRESS, AK_HXL), vec![0x0A, 0x00, 0x14, 0x00, 0, 0, 0, 0]);
        let mut imu = chip(bus);

        let [gx, _, gz, ax, _, _] = imu.read_accel_gyro().await.unwrap();
        let [mx, my, _] = imu.read_magnetometer().await.unwrap();

        assert_eq!(gx, 0.0);
        assert!((gz - 10.0).abs() < 1e-9);
        assert!((ax - STANDARD_GRAVITY).abs() < 1e-9);
        assert!((mx - 1.5).abs() < 1e-9);
        assert!((my - 3.0).abs() < 1e-9);
        assert!(imu.bus.writes.is_empty());
    }

    #[tokio::test]
    async fn test_read_errors_pass_through_as_bus_errors() {
        let mut bus = FakeBus::healthy();
        bus.fail_reads = true;
        let mut imu = chip(bus);

        assert!(matches!(imu.read_accel_gyro().await.unwrap_err(), SensorError::I2c(_)));
        assert!(matches!(imu.read_magnetometer().await.unwrap_err(), SensorError::I2c(_)));
    }

    #[test]
    fn test_accel_gyro_split_and_scale() {
        // accel x = +1g, y = -1g, z = 0; gyro x = 131 LSB, y = -262, z = 0
        let buf = [
            0x40, 0x00, 0xC0, 0x00, 0x00, 0x00, // accel
            0x00, 0x83, 0xFE, 0xFA, 0x00, 0x00, // gyro
        ];

        let [gx, gy, gz, ax, ay, az] = decode_accel_gyro(&buf, AccelRange::G2, GyroRange::Dps250);

        assert!((gx - 1.0).abs() < 1e-9);
        assert!((gy + 2.0).abs() < 1e-9);
        assert_eq!(gz, 0.0);
        assert!((ax - STANDARD_GRAVITY).abs() < 1e-9);
        assert!((ay + STANDARD_GRAVITY).abs() < 1e-9);
        assert_eq!(az, 0.0);
    }

    #[test]
    fn test_accel_gyro_respects_range() {
        let buf = [0x40, 0x00, 0, 0, 0, 0, 0x00, 0x83, 0, 0, 0, 0];

        let sample = decode_accel_gyro(&buf, AccelRange::G4, GyroRange::Dps500);

        assert!((sample[3] - 2.0 * STANDARD_GRAVITY).abs() < 1e-9);
        assert!((sample[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_magnetometer_little_endian() {
        // x = 100 LSB, y = -100 LSB, z = 0, TMPS, ST2 clear
        let buf = [0x64, 0x00, 0x9C, 0xFF, 0x00, 0x00, 0x00, 0x00];

        let [mx, my, mz] = decode_magnetometer("imu0", &buf).unwrap();

        assert!((mx - 15.0).abs() < 1e-9);
        assert!((my + 15.0).abs() < 1e-9);
        assert_eq!(mz, 0.0);
    }

    #[test]
    fn test_magnetometer_overflow_rejected() {
        let buf = [0x64, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, AK_ST2_HOFL];

        let err = decode_magnetometer("imu0", &buf).unwrap_err();

        assert!(matches!(err, SensorError::DataError { .. }));
    }
}
