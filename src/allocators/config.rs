use super::{IdTableError, Id, Result};

pub const DEFAULT_ID_BASE: Id = 1;
/// Kept well below `i32::MAX` so ids survive a signed 32-bit wire field.
pub const DEFAULT_ID_LIMIT: Id = 1_000_000_000;
pub const DEFAULT_INITIAL_GROWTH: usize = 16;

/// Creation-time knobs of an [`IdTable`](super::IdTable).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdTableConfig {
    /// Smallest id ever issued. Many callers reserve 0 as "no handle".
    pub base: Id,
    /// Exclusive upper bound of issued ids.
    pub limit: Id,
    /// Slots in the first chunk; later chunks grow geometrically.
    pub initial_growth: usize,
}

impl Default for IdTableConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_ID_BASE,
            limit: DEFAULT_ID_LIMIT,
            initial_growth: DEFAULT_INITIAL_GROWTH,
        }
    }
}

impl IdTableConfig {
    pub fn with_base(mut self, base: Id) -> Self {
        self.base = base;
        self
    }

    pub fn with_limit(mut self, limit: Id) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_initial_growth(mut self, initial_growth: usize) -> Self {
        self.initial_growth = initial_growth;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.base >= self.limit {
            return Err(IdTableError::InvalidConfig("base must be below limit"));
        }
        if self.initial_growth == 0 {
            return Err(IdTableError::InvalidConfig("initial growth must be non-zero"));
        }
        if self.initial_growth > u32::MAX as usize {
            return Err(IdTableError::InvalidConfig("initial growth exceeds chunk capacity"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = IdTableConfig::default();
        assert_eq!(config.base, 1);
        assert_eq!(config.limit, 1_000_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_empty_range_and_zero_growth() {
        let config = IdTableConfig::default().with_base(5).with_limit(5);
        assert!(matches!(
            config.validate(),
            Err(IdTableError::InvalidConfig(_))
        ));

        let config = IdTableConfig::default().with_initial_growth(0);
        assert!(matches!(
            config.validate(),
            Err(IdTableError::InvalidConfig(_))
        ));
    }
}
