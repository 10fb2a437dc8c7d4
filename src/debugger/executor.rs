use super::commands::{BreakpointAction, Command, CommandError, CommandResult, SetTarget};
use crate::chip8::{Chip8Error, Chip8Runner, Display, MEMORY_SIZE, Mode, RunnerResult};
use std::collections::HashSet;

/// Applies debugger commands to a `Chip8Runner` and exposes machine state
/// for the front-end to render.
pub struct Executor {
    is_running: bool,
    runner: Chip8Runner,
    breakpoints: HashSet<u16>,
}

impl Executor {
    pub fn new(runner: Chip8Runner) -> Self {
        Self {
            is_running: false,
            runner,
            breakpoints: HashSet::new(),
        }
    }

    /// Advances the machine when the debugger is in running mode. Execution
    /// errors and breakpoint hits drop back to paused mode.
    pub fn poll(&mut self, dt: f32) -> Result<RunnerResult, Chip8Error> {
        if !self.is_running {
            return Ok(RunnerResult::Ok);
        }

        let result = self
            .runner
            .update_with_breakpoints(dt, Some(&self.breakpoints));

        if matches!(result, Err(_) | Ok(RunnerResult::HitBreakpoint)) {
            self.is_running = false;
        }

        result
    }

    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        match command {
            Command::Run => {
                self.is_running = true;
                Ok(CommandResult::Ok)
            }
            Command::Pause => {
                self.is_running = false;
                Ok(CommandResult::Ok)
            }
            Command::Step => {
                self.runner.chip8_mut().step()?;
                Ok(CommandResult::Ok)
            }
            Command::Reset => {
                self.is_running = false;
                self.runner.chip8_mut().reset();
                Ok(CommandResult::Ok)
            }
            Command::Breakpoint { action } => self.handle_breakpoint(action),
            Command::Set { target, value } => self.handle_set(target, value),
            Command::Mem { start, len } => self.handle_mem(start, len),
            Command::Quit => Ok(CommandResult::Quit),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn mode(&self) -> Mode {
        self.runner.chip8_ref().mode()
    }

    pub fn display(&self) -> &Display<bool> {
        self.runner.chip8_ref().display()
    }

    pub fn pc(&self) -> u16 {
        self.runner.chip8_ref().pc
    }

    pub fn i(&self) -> u16 {
        self.runner.chip8_ref().i
    }

    pub fn v(&self) -> &[u8; 16] {
        &self.runner.chip8_ref().v
    }

    /// The live portion of the call stack, bottom first.
    pub fn stack(&self) -> &[u16] {
        let chip8 = self.runner.chip8_ref();
        &chip8.stack[..chip8.sp as usize]
    }

    pub fn delay_timer(&self) -> u8 {
        self.runner.chip8_ref().delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.runner.chip8_ref().sound_timer
    }

    pub fn keypad(&self) -> &[bool; 16] {
        &self.runner.chip8_ref().keypad
    }

    pub fn runner_mut(&mut self) -> &mut Chip8Runner {
        &mut self.runner
    }

    fn handle_breakpoint(
        &mut self,
        action: BreakpointAction,
    ) -> Result<CommandResult, CommandError> {
        match action {
            BreakpointAction::Set { addr } => {
                self.breakpoints.insert(addr);
            }
            BreakpointAction::Clear { addr } => {
                self.breakpoints.remove(&addr);
            }
            BreakpointAction::ClearAll => {
                self.breakpoints.clear();
            }
            BreakpointAction::List => {
                let mut breakpoints: Vec<u16> = self.breakpoints.iter().copied().collect();
                breakpoints.sort();
                return Ok(CommandResult::Breakpoints(breakpoints));
            }
        };

        Ok(CommandResult::Ok)
    }

    fn handle_set(&mut self, target: SetTarget, value: u16) -> Result<CommandResult, CommandError> {
        let chip8 = self.runner.chip8_mut();

        match target {
            SetTarget::V(reg) => {
                chip8.v[reg] = u8::try_from(value).map_err(|_| CommandError::ValueOutOfRange)?;
            }
            SetTarget::I => {
                chip8.i = value;
            }
            SetTarget::Pc => {
                chip8.pc = value;
            }
        }

        Ok(CommandResult::Ok)
    }

    fn handle_mem(&self, start: u16, len: u16) -> Result<CommandResult, CommandError> {
        let start_idx = start as usize;
        if start_idx >= MEMORY_SIZE {
            return Err(CommandError::ValueOutOfRange);
        }

        let end_idx = (start_idx + len as usize).min(MEMORY_SIZE);
        let data = self.runner.chip8_ref().memory[start_idx..end_idx].to_vec();

        Ok(CommandResult::MemDump {
            data,
            offset: start,
        })
    }
}
