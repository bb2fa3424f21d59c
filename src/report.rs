/*!
Error report returned from `main`, printing the whole `source()` chain
of a Snafu error instead of its `Debug` form.
*/

use std::{error::Error as StdError, fmt};

pub struct Report(Box<dyn StdError>);

impl Report {
    /// Iterates over the error and every error that caused it.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        std::iter::successors(Some(self.0.as_ref()), |&e| e.source())
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chain = self.chain();
        if let Some(top) = chain.next() {
            writeln!(f, "{}", top)?;
        }

        let mut causes = chain.enumerate().peekable();
        if causes.peek().is_some() {
            writeln!(f, "\nCaused by:")?;
            for (i, e) in causes {
                writeln!(f, "  {}: {}", i, e)?;
            }
        }

        Ok(())
    }
}

impl<E: Into<Box<dyn StdError>>> From<E> for Report {
    fn from(e: E) -> Self {
        Report(e.into())
    }
}
