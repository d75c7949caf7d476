//! Protocol stdout isolation.
//!
//! The server speaks JSON-RPC on stdout, but document parsers may print
//! diagnostics with `println!`. [`detach_stdout`] moves the real stdout to
//! a private descriptor and points fd 1 at stderr, so stray prints end up
//! in the diagnostic stream.

use std::fs::File;
use std::io::{self, Write};
use std::os::fd::FromRawFd;

/// Move the process stdout to a new descriptor and point fd 1 at stderr.
///
/// The returned file is the only handle that still reaches the client.
pub fn detach_stdout() -> io::Result<File> {
    io::stdout().flush()?;

    // SAFETY: fcntl/dup2/close only operate on descriptor numbers.
    let saved = unsafe { libc::fcntl(libc::STDOUT_FILENO, libc::F_DUPFD_CLOEXEC, 0) };
    if saved < 0 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::dup2(libc::STDERR_FILENO, libc::STDOUT_FILENO) } < 0 {
        let err = io::Error::last_os_error();
        unsafe { libc::close(saved) };
        return Err(err);
    }

    // SAFETY: `saved` is a freshly duplicated descriptor owned by nothing else.
    Ok(unsafe { File::from_raw_fd(saved) })
}
