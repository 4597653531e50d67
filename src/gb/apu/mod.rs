//! APU (§4.8): four sound channels, an 8-step frame sequencer clocking
//! length/envelope/sweep, and a mixer emitting a stereo sample stream at
//! host sample rate. Gated entirely by NR52's master-enable bit.

mod channel;
mod noise;
mod pulse;
mod wave;

use crate::gb::memory::constants::{WAVE_RAM_BEGIN, WAVE_RAM_END};
use crate::gb::AddressSpace;
use noise::NoiseChannel;
use pulse::PulseChannel;
use wave::WaveChannel;

/// Cycles between frame-sequencer steps (512 Hz at the 4.194304 MHz master clock).
const FRAME_SEQUENCER_PERIOD: u32 = 8192;

/// Host sample rate the mixer resamples down to.
const SAMPLE_RATE: u32 = 44100;

const CPU_CLOCK_SPEED: f64 = 4.0 * 1024.0 * 1024.0;

pub struct Apu {
    enabled: bool,
    pulse1: PulseChannel,
    pulse2: PulseChannel,
    wave: WaveChannel,
    noise: NoiseChannel,

    /// NR50: per-side master volume, 0-7.
    left_volume: u8,
    right_volume: u8,
    /// NR51: per-channel left/right panning.
    panning: u8,

    sequencer_cycles: u32,
    sequencer_step: u8,

    sample_accumulator: f64,
    samples: Vec<(f32, f32)>,
}

impl Apu {
    pub fn new() -> Self {
        Self {
            enabled: true,
            pulse1: PulseChannel::new(true),
            pulse2: PulseChannel::new(false),
            wave: WaveChannel::new(),
            noise: NoiseChannel::new(),
            left_volume: 7,
            right_volume: 7,
            panning: 0xFF,
            sequencer_cycles: 0,
            sequencer_step: 0,
            sample_accumulator: 0.0,
            samples: Vec::new(),
        }
    }

    /// Advances every channel and the frame sequencer by `cycles` CPU
    /// cycles, emitting mixed samples at `SAMPLE_RATE` along the way.
    pub fn step(&mut self, cycles: u16) {
        if !self.enabled {
            return;
        }

        self.pulse1.step(cycles);
        self.pulse2.step(cycles);
        self.wave.step(cycles);
        self.noise.step(cycles);

        self.sequencer_cycles += u32::from(cycles);
        while self.sequencer_cycles >= FRAME_SEQUENCER_PERIOD {
            self.sequencer_cycles -= FRAME_SEQUENCER_PERIOD;
            self.clock_sequencer();
        }

        let cycles_per_sample = CPU_CLOCK_SPEED / f64::from(SAMPLE_RATE);
        self.sample_accumulator += f64::from(cycles);
        while self.sample_accumulator >= cycles_per_sample {
            self.sample_accumulator -= cycles_per_sample;
            self.samples.push(self.mix());
        }
    }

    fn clock_sequencer(&mut self) {
        match self.sequencer_step {
            0 | 4 => self.clock_length(),
            2 | 6 => {
                self.clock_length();
                self.pulse1.clock_sweep();
            }
            7 => self.clock_envelope(),
            _ => {}
        }
        self.sequencer_step = (self.sequencer_step + 1) % 8;
    }

    fn clock_length(&mut self) {
        self.pulse1.clock_length();
        self.pulse2.clock_length();
        self.wave.clock_length();
        self.noise.clock_length();
    }

    fn clock_envelope(&mut self) {
        self.pulse1.clock_envelope();
        self.pulse2.clock_envelope();
        self.noise.clock_envelope();
    }

    /// Mixes the four channels' current digital samples down to a stereo
    /// float pair in roughly [-1, 1], routed per NR51 and scaled by NR50.
    fn mix(&self) -> (f32, f32) {
        let digital = [
            self.pulse1.sample(),
            self.pulse2.sample(),
            self.wave.sample(),
            self.noise.sample(),
        ];

        let mut left = 0i32;
        let mut right = 0i32;
        for (i, &sample) in digital.iter().enumerate() {
            let analog = i32::from(sample);
            if self.panning & (1 << (i + 4)) != 0 {
                left += analog;
            }
            if self.panning & (1 << i) != 0 {
                right += analog;
            }
        }

        let left = (left as f32 / 60.0) * (f32::from(self.left_volume) + 1.0) / 8.0;
        let right = (right as f32 / 60.0) * (f32::from(self.right_volume) + 1.0) / 8.0;
        (left, right)
    }

    /// Drains all samples produced since the last call.
    pub fn drain_samples(&mut self) -> Vec<(f32, f32)> {
        std::mem::take(&mut self.samples)
    }

    fn power_off(&mut self) {
        self.pulse1 = PulseChannel::new(true);
        self.pulse2 = PulseChannel::new(false);
        self.wave.power_off();
        self.noise = NoiseChannel::new();
        self.left_volume = 0;
        self.right_volume = 0;
        self.panning = 0;
        self.sequencer_step = 0;
    }

    fn nr52(&self) -> u8 {
        let mut value = 0x70;
        value |= u8::from(self.enabled) << 7;
        value |= u8::from(self.pulse1.enabled);
        value |= u8::from(self.pulse2.enabled) << 1;
        value |= u8::from(self.wave.enabled) << 2;
        value |= u8::from(self.noise.enabled) << 3;
        value
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace for Apu {
    fn write(&mut self, address: u16, value: u8) {
        if (WAVE_RAM_BEGIN..=WAVE_RAM_END).contains(&address) {
            self.wave.write_wave_ram(address - WAVE_RAM_BEGIN, value);
            return;
        }

        if !self.enabled && address != 0xFF26 {
            return;
        }

        match address {
            0xFF10 => self.pulse1.write_sweep(value),
            0xFF11 => self.pulse1.write_duty_length(value),
            0xFF12 => self.pulse1.write_envelope(value),
            0xFF13 => self.pulse1.write_freq_lo(value),
            0xFF14 => self.pulse1.write_freq_hi(value),

            0xFF16 => self.pulse2.write_duty_length(value),
            0xFF17 => self.pulse2.write_envelope(value),
            0xFF18 => self.pulse2.write_freq_lo(value),
            0xFF19 => self.pulse2.write_freq_hi(value),

            0xFF1A => self.wave.write_dac_enable(value),
            0xFF1B => self.wave.write_length(value),
            0xFF1C => self.wave.write_output_level(value),
            0xFF1D => self.wave.write_freq_lo(value),
            0xFF1E => self.wave.write_freq_hi(value),

            0xFF20 => self.noise.write_length(value),
            0xFF21 => self.noise.write_envelope(value),
            0xFF22 => self.noise.write_poly(value),
            0xFF23 => self.noise.write_control(value),

            0xFF24 => {
                self.right_volume = value & 0b0111;
                self.left_volume = (value >> 4) & 0b0111;
            }
            0xFF25 => self.panning = value,
            0xFF26 => {
                let was_enabled = self.enabled;
                self.enabled = value & 0b1000_0000 != 0;
                if was_enabled && !self.enabled {
                    self.power_off();
                }
            }
            _ => {}
        }
    }

    fn read(&self, address: u16) -> u8 {
        if (WAVE_RAM_BEGIN..=WAVE_RAM_END).contains(&address) {
            return self.wave.read_wave_ram(address - WAVE_RAM_BEGIN);
        }

        match address {
            0xFF10 => self.pulse1.sweep.to_byte() | 0x80,
            0xFF11 => (self.pulse1.duty() << 6) | 0x3F,
            0xFF12 => self.pulse1.envelope.to_byte(),
            0xFF13 => 0xFF,
            0xFF14 => (u8::from(self.pulse1.length.enabled()) << 6) | 0xBF,

            0xFF16 => (self.pulse2.duty() << 6) | 0x3F,
            0xFF17 => self.pulse2.envelope.to_byte(),
            0xFF18 => 0xFF,
            0xFF19 => (u8::from(self.pulse2.length.enabled()) << 6) | 0xBF,

            0xFF1A => (u8::from(self.wave.dac_enabled()) << 7) | 0x7F,
            0xFF1B => 0xFF,
            0xFF1C => (self.wave.output_level() << 5) | 0x9F,
            0xFF1D => 0xFF,
            0xFF1E => (u8::from(self.wave.length.enabled()) << 6) | 0xBF,

            0xFF20 => 0xFF,
            0xFF21 => self.noise.envelope.to_byte(),
            0xFF22 => self.noise.poly_byte(),
            0xFF23 => (u8::from(self.noise.length.enabled()) << 6) | 0xBF,

            0xFF24 => (self.left_volume << 4) | self.right_volume,
            0xFF25 => self.panning,
            0xFF26 => self.nr52(),
            _ => 0xFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unused_bits_read_as_one() {
        let apu = Apu::new();
        assert_eq!(apu.read(0xFF10) & 0x80, 0x80);
        assert_eq!(apu.read(0xFF11) & 0x3F, 0x3F);
        assert_eq!(apu.read(0xFF13), 0xFF);
        assert_eq!(apu.read(0xFF14) & 0xBF, 0xBF);
        assert_eq!(apu.read(0xFF1A) & 0x7F, 0x7F);
        assert_eq!(apu.read(0xFF23) & 0xBF, 0xBF);
        assert_eq!(apu.read(0xFF26) & 0x70, 0x70);
    }

    #[test]
    fn test_written_duty_and_envelope_round_trip_through_read() {
        let mut apu = Apu::new();
        apu.write(0xFF11, 0b11_000000); // duty 75%
        assert_eq!(apu.read(0xFF11) >> 6, 0b11);

        apu.write(0xFF12, 0b1010_1001);
        assert_eq!(apu.read(0xFF12), 0b1010_1001);
    }

    #[test]
    fn test_power_off_preserves_wave_ram_but_zeroes_nr50_nr51() {
        let mut apu = Apu::new();
        apu.write(0xFF30, 0xAB);
        apu.write(0xFF24, 0x77);
        apu.write(0xFF25, 0xFF);

        apu.write(0xFF26, 0x00); // master disable

        assert_eq!(apu.read(0xFF30), 0xAB);
        assert_eq!(apu.read(0xFF24), 0x00);
        assert_eq!(apu.read(0xFF25), 0x00);
        assert_eq!(apu.read(0xFF26) & 0x80, 0x00);
    }

    #[test]
    fn test_register_writes_ignored_while_powered_off_except_wave_ram_and_nr52() {
        let mut apu = Apu::new();
        apu.write(0xFF26, 0x00);

        apu.write(0xFF11, 0xFF);
        assert_eq!(apu.read(0xFF11) >> 6, 0);

        apu.write(0xFF26, 0x80); // re-enable
        assert_eq!(apu.read(0xFF26) & 0x80, 0x80);
    }
}
