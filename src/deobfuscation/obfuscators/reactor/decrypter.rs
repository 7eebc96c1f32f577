//! XOR keystream decryption of embedded resources.
//!
//! The keystream is a chain: each magic word is computed from the previous one, starting at
//! zero, and XORed over the next four bytes of the buffer. A trailing partial word only uses
//! the low bytes of its keystream word.

use rayon::prelude::*;

use crate::{
    deobfuscation::{
        obfuscators::reactor::{
            calculator::MagicCalculator,
            locator::{locate, Dialect, LocateStrategy, LoopWindow},
        },
        DecrypterConfig, LocateStrategies,
    },
    emulation::{InstructionEmulator, Interpreter},
    metadata::method::Method,
    Error, Result,
};

/// Decrypter for resources protected by a .NET Reactor keystream loop.
///
/// Construction locates the loop in the decrypter method once; afterwards the method is no
/// longer needed. One instance must not be shared between concurrent `decrypt` calls; clone it
/// instead (see [`decrypt_all`]).
///
/// # Example
///
/// ```rust,no_run
/// use keyscope::deobfuscation::ResourceDecrypter;
/// # fn load() -> keyscope::Result<(keyscope::metadata::method::Method, Vec<u8>)> { unimplemented!() }
///
/// let (method, encrypted) = load()?;
/// let mut decrypter = ResourceDecrypter::new(&method)?;
/// println!("{} loop, dialect {}", decrypter.strategy(), decrypter.dialect());
///
/// let plain = decrypter.decrypt(&encrypted)?;
/// assert_eq!(plain.len(), encrypted.len());
/// # Ok::<(), keyscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ResourceDecrypter<E = Interpreter> {
    calculator: MagicCalculator<E>,
    strategies: LocateStrategies,
}

impl ResourceDecrypter<Interpreter> {
    /// Creates a decrypter for `method` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoopNotFound`] if the method holds no recognised keystream loop.
    pub fn new(method: &Method) -> Result<Self> {
        Self::with_config(method, DecrypterConfig::default())
    }

    /// Creates a decrypter for `method` using the built-in [`Interpreter`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoopNotFound`] if none of the enabled strategies matches.
    pub fn with_config(method: &Method, config: DecrypterConfig) -> Result<Self> {
        Self::with_emulator(method, Interpreter::new(config.limits), config.strategies)
    }
}

impl<E: InstructionEmulator> ResourceDecrypter<E> {
    /// Creates a decrypter for `method` that runs the loop on `emulator`.
    ///
    /// Execution limits are whatever `emulator` enforces itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoopNotFound`] if none of `strategies` matches.
    pub fn with_emulator(
        method: &Method,
        emulator: E,
        strategies: LocateStrategies,
    ) -> Result<Self> {
        let window = locate(method, strategies)?;
        Ok(ResourceDecrypter {
            calculator: MagicCalculator::new(method, window, emulator),
            strategies,
        })
    }

    /// Dialect of the located loop.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.calculator.window().dialect
    }

    /// Strategy that located the loop.
    #[must_use]
    pub fn strategy(&self) -> LocateStrategy {
        self.calculator.window().strategy
    }

    /// Inclusive instruction index range of the loop in the decrypter method.
    #[must_use]
    pub fn window(&self) -> (usize, usize) {
        let window = self.calculator.window();
        (window.start, window.end)
    }

    /// Local slot holding the running sum.
    #[must_use]
    pub fn accumulator(&self) -> u16 {
        self.calculator.window().accumulator
    }

    /// The located loop, including its cloned instructions.
    #[must_use]
    pub fn loop_window(&self) -> &LoopWindow {
        self.calculator.window()
    }

    /// Locating strategies this decrypter was built with.
    #[must_use]
    pub fn strategies(&self) -> LocateStrategies {
        self.strategies
    }

    /// Computes the magic word that follows `input`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MagicCalculation`] if the loop does not yield a concrete 32-bit word.
    pub fn calculate(&mut self, input: u32) -> Result<u32> {
        self.calculator.calculate(input)
    }

    /// Successive magic words, starting from a running sum of zero.
    ///
    /// The iterator ends after the first error.
    pub fn keystream(&mut self) -> Keystream<'_, E> {
        Keystream {
            calculator: &mut self.calculator,
            sum: 0,
            failed: false,
        }
    }

    /// Decrypts `data` into a new buffer of the same length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MagicCalculation`] if a keystream word cannot be computed; no partial
    /// output is returned.
    pub fn decrypt(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let mut plain = data.to_vec();
        self.decrypt_in_place(&mut plain)?;
        Ok(plain)
    }

    /// Decrypts `data` in place.
    ///
    /// The whole keystream is computed before the buffer is touched, so `data` is left
    /// unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MagicCalculation`] if a keystream word cannot be computed.
    pub fn decrypt_in_place(&mut self, data: &mut [u8]) -> Result<()> {
        let words = data.len().div_ceil(4);
        let keystream = self.keystream().take(words).collect::<Result<Vec<u32>>>()?;

        for (offset, word) in (0..data.len()).step_by(4).zip(keystream) {
            let cipher = read_u32_tail(data, offset)?;
            write_u32_tail(data, offset, cipher ^ word)?;
        }

        Ok(())
    }
}

/// Iterator over the magic words of a [`ResourceDecrypter`].
#[derive(Debug)]
pub struct Keystream<'a, E> {
    calculator: &'a mut MagicCalculator<E>,
    sum: u32,
    failed: bool,
}

impl<E: InstructionEmulator> Iterator for Keystream<'_, E> {
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.calculator.calculate(self.sum) {
            Ok(word) => {
                self.sum = word;
                Some(Ok(word))
            }
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
        }
    }
}

/// Decrypts independent resources in parallel.
///
/// Every worker decrypts with its own clone of `decrypter`; results keep the input order.
///
/// # Errors
///
/// Returns the first error any resource produced.
pub fn decrypt_all<E>(decrypter: &ResourceDecrypter<E>, resources: &[&[u8]]) -> Result<Vec<Vec<u8>>>
where
    E: InstructionEmulator + Clone + Send + Sync,
{
    resources
        .par_iter()
        .map_init(|| decrypter.clone(), |worker, data| worker.decrypt(data))
        .collect()
}

/// Reads up to four little-endian bytes at `offset`; missing high bytes are zero.
///
/// # Errors
///
/// Returns [`Error::BufferUnderrun`] if no byte is available at `offset`.
pub fn read_u32_tail(data: &[u8], offset: usize) -> Result<u32> {
    let rest = tail(data.len(), offset)?;

    let mut word = [0u8; 4];
    word[..rest].copy_from_slice(&data[offset..offset + rest]);
    Ok(u32::from_le_bytes(word))
}

/// Writes the low bytes of `value` at `offset`, as many as fit (at most four).
///
/// # Errors
///
/// Returns [`Error::BufferUnderrun`] if no byte is available at `offset`.
pub fn write_u32_tail(data: &mut [u8], offset: usize, value: u32) -> Result<()> {
    let rest = tail(data.len(), offset)?;

    data[offset..offset + rest].copy_from_slice(&value.to_le_bytes()[..rest]);
    Ok(())
}

fn tail(len: usize, offset: usize) -> Result<usize> {
    let available = len.saturating_sub(offset);
    if available == 0 {
        return Err(Error::BufferUnderrun { offset, available });
    }
    Ok(available.min(4))
}
