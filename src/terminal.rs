// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor, event,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::cell::Cell;
use crate::frame::Frame;

pub struct Terminal {
    stdout: Stdout,
    last_size: Option<(u16, u16)>,
    run: String,
}

#[derive(Default)]
struct Pen {
    fg: Option<Option<Color>>,
    bg: Option<Option<Color>>,
    pos: Option<(u16, u16)>,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()
        })();
        if let Err(e) = init {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            last_size: None,
            run: String::with_capacity(64),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    fn set_colors(&mut self, pen: &mut Pen, cell: &Cell) -> Result<()> {
        if pen.fg != Some(cell.fg) {
            self.stdout
                .queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            pen.fg = Some(cell.fg);
        }
        if pen.bg != Some(cell.bg) {
            self.stdout
                .queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
            pen.bg = Some(cell.bg);
        }
        Ok(())
    }

    /// Present `frame`, batching runs of same-coloured changed cells.
    pub fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        let resized = self.last_size != Some((frame.width, frame.height));
        if resized {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.last_size = Some((frame.width, frame.height));
        }

        let total = frame.width as usize * frame.height as usize;
        let mut changed: Vec<usize> = if resized || frame.is_dirty_all() {
            (0..total).collect()
        } else {
            frame.dirty_indices().to_vec()
        };
        changed.sort_unstable();

        let width = frame.width as usize;
        let mut pen = Pen::default();
        let mut i = 0;
        while i < changed.len() {
            let start = changed[i];
            let first = frame.cell(start);
            let y = (start / width) as u16;
            let x = (start % width) as u16;

            self.run.clear();
            self.run.push(first.ch);
            let mut j = i + 1;
            while j < changed.len() {
                let idx = changed[j];
                let next = frame.cell(idx);
                let same_row = idx / width == start / width;
                if idx != changed[j - 1] + 1 || !same_row || next.fg != first.fg || next.bg != first.bg
                {
                    break;
                }
                self.run.push(next.ch);
                j += 1;
            }

            if pen.pos != Some((x, y)) {
                self.stdout.queue(cursor::MoveTo(x, y))?;
            }
            self.set_colors(&mut pen, &first)?;
            self.stdout.queue(Print(self.run.as_str()))?;
            let end = x.saturating_add((j - i) as u16);
            pen.pos = (end < frame.width).then_some((end, y));
            i = j;
        }

        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.stdout.flush();
        restore_terminal_best_effort();
    }
}

pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
