use super::{Chip8, Chip8Error, StepResult};
use crate::u4;
use std::collections::HashSet;

const CPU_HZ: f32 = 700.0;
const TIMER_HZ: f32 = 60.0;

const CPU_TIME_STEP: f32 = 1.0 / CPU_HZ;
const TIMER_TIME_STEP: f32 = 1.0 / TIMER_HZ;

/// High-level emulator runner that manages timing internally.
///
/// Instructions run at a nominal 700Hz and the timers tick at 60Hz,
/// regardless of how often the host calls `update`.
pub struct Chip8Runner {
    chip8: Chip8,
    cpu_dt_accumulator: f32,
    timer_dt_accumulator: f32,
}

pub enum RunnerResult {
    Ok,
    HitBreakpoint,
}

impl Chip8Runner {
    pub fn new(chip8: Chip8) -> Self {
        Self {
            chip8,
            cpu_dt_accumulator: 0.0,
            timer_dt_accumulator: 0.0,
        }
    }

    /// Update emulator by delta time, handles both CPU and timer cycles.
    ///
    /// Runs as many CPU steps and timer ticks as the elapsed time `dt` calls
    /// for. Returns early if a frame has to be rendered before the next step.
    pub fn update(&mut self, dt: f32) -> Result<RunnerResult, Chip8Error> {
        self.update_with_breakpoints(dt, None)
    }

    /// Like `update` but checks for breakpoints after each CPU step.
    pub fn update_with_breakpoints(
        &mut self,
        dt: f32,
        breakpoints: Option<&HashSet<u16>>,
    ) -> Result<RunnerResult, Chip8Error> {
        self.cpu_dt_accumulator += dt;
        self.timer_dt_accumulator += dt;

        while self.timer_dt_accumulator >= TIMER_TIME_STEP {
            self.timer_dt_accumulator -= TIMER_TIME_STEP;
            self.chip8.tick_timers();
        }

        while self.cpu_dt_accumulator >= CPU_TIME_STEP {
            self.cpu_dt_accumulator -= CPU_TIME_STEP;

            let step_result = self.chip8.step()?;

            if let Some(breakpoints) = &breakpoints
                && breakpoints.contains(&self.chip8.pc)
            {
                self.cpu_dt_accumulator = 0.0;
                return Ok(RunnerResult::HitBreakpoint);
            }

            match step_result {
                StepResult::NextFrame => {
                    // If we need to wait for the next frame we stop executing.
                    // We clear the accumulator to avoid "catching up" in the
                    // next frame.
                    self.cpu_dt_accumulator = 0.0;
                    break;
                }
                StepResult::Continue => {}
            }
        }

        Ok(RunnerResult::Ok)
    }

    /// Returns true if the sound timer is active, indicating the host should
    /// be playing its tone.
    pub fn sound_active(&self) -> bool {
        self.chip8.sound_active()
    }

    /// Set the state of a key on the keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.chip8.set_key(key, pressed)
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    pub fn pixel(&self, y: usize, x: usize) -> bool {
        self.chip8.pixel(y, x)
    }

    pub fn chip8_ref(&self) -> &Chip8 {
        &self.chip8
    }

    pub fn chip8_mut(&mut self) -> &mut Chip8 {
        &mut self.chip8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_runs_timers_at_their_own_rate() {
        let mut chip8 = Chip8::new();
        // Harmless infinite loop: jump to self
        chip8.load(&[0x12, 0x00]).unwrap();
        chip8.delay_timer = 120;
        chip8.sound_timer = 30;

        let mut runner = Chip8Runner::new(chip8);
        // One second of wall time ticks the timers about 60 times; float
        // accumulation may land one tick short
        runner.update(1.0).unwrap();

        assert!(matches!(runner.chip8_ref().delay_timer, 60 | 61));
        assert_eq!(runner.chip8_ref().sound_timer, 0);
    }

    #[test]
    fn update_continues_past_unknown_opcodes() {
        let mut chip8 = Chip8::new();
        // An unrecognized instruction followed by V0 = 1 and a self-jump
        chip8.load(&[0x5A, 0xB1, 0x60, 0x01, 0x12, 0x04]).unwrap();
        let mut runner = Chip8Runner::new(chip8);

        assert!(matches!(
            runner.update(1.0),
            Err(Chip8Error::UnknownOpcode { opcode: 0x5AB1 })
        ));
        // The PC is already past the bad instruction, so a host that treats
        // the error as non-fatal picks up right after it
        assert_eq!(runner.chip8_ref().pc, 0x202);

        runner.update(1.0).unwrap();
        assert_eq!(runner.chip8_ref().v[0], 1);
    }

    #[test]
    fn breakpoint_stops_the_run() {
        let mut chip8 = Chip8::new();
        chip8.load(&[0x60, 0x01, 0x12, 0x00]).unwrap();
        let mut runner = Chip8Runner::new(chip8);

        let breakpoints = HashSet::from([0x202u16]);
        let result = runner
            .update_with_breakpoints(1.0, Some(&breakpoints))
            .unwrap();

        assert!(matches!(result, RunnerResult::HitBreakpoint));
        assert_eq!(runner.chip8_ref().pc, 0x202);
    }
}
