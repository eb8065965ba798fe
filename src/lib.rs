/*!
A streaming, callback-driven engine for Standard MIDI Files (SMF formats 0, 1, and 2).

The engine never builds an in-memory representation of a file. [`read_file`] walks an MThd and
its MTrk chunks event by event, handing each one to a host-supplied [`ReadVisitor`]; [`write_file`]
does the inverse, pulling events one at a time from a host-supplied [`WriteEmitter`]. Both sides
share a [`Session`], the single piece of state (running status, chunk byte budget, flags) threaded
through one call.

```no_run
use smf_engine::{read_path, visitor::ReadVisitor, Session, StandardEvent};
use smf_engine::io::FileIo;

struct CountNoteOns(u32);

impl ReadVisitor<FileIo> for CountNoteOns {
    fn standard_event(&mut self, _session: &mut Session<FileIo>, event: StandardEvent) -> smf_engine::Result<()> {
        if event.status & 0xF0 == 0x90 && event.data1 > 0 {
            self.0 += 1;
        }
        Ok(())
    }
}

let mut counter = CountNoteOns(0);
read_path("song.mid", &mut counter)?;
# Ok::<(), smf_engine::Error>(())
```
!*/
#![allow(dead_code)]

#[macro_use]
mod error;

mod chunk;
pub mod constants;
pub mod event;
pub mod flags;
pub mod header;
pub mod io;
mod meta;
mod reader;
mod session;
pub mod vlq;
pub mod visitor;
mod writer;

pub mod helpers;

pub use crate::error::{error_message, Error, Result};
pub use crate::event::{
    KeySignature, SmpteOffset, StandardEvent, SysexKind, SystemEvent, Tempo, TimeSignature,
};
pub use crate::flags::Flags;
pub use crate::header::{Division, Format};
pub use crate::io::{FileIo, MemoryIo, MidiIo, OpenMode};
pub use crate::reader::{read_file, read_memory, read_path};
pub use crate::session::{Mode, Session};
pub use crate::visitor::{OutEvent, OutEventKind, ReadVisitor, WriteEmitter};
pub use crate::writer::{write_file, write_memory, write_path};

pub use crate::vlq::{u32_to_vlq, vlq_to_u32, VlqError};
