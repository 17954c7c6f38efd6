//! MQ135 gas sensor sampling

use log::trace;

/// Largest value the sampler reports, the top of a 10-bit conversion.
pub const RAW_GAS_MAX: u16 = 1023;

/// Port to the analog-to-digital converter channel wired to the MQ135.
pub trait AnalogInput {
    /// Begin a single conversion.
    fn start_conversion(&mut self);

    /// Whether the conversion started last has finished.
    fn is_complete(&mut self) -> bool;

    /// Result of the finished conversion.
    fn read_value(&mut self) -> u16;
}

/// Raw MQ135 output in `0..=1023`. Lower means cleaner air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct RawGasSample(u16);

impl RawGasSample {
    /// Clamp `raw` into the 10-bit range.
    pub const fn new(raw: u16) -> Self {
        if raw > RAW_GAS_MAX {
            Self(RAW_GAS_MAX)
        } else {
            Self(raw)
        }
    }

    pub const fn value(self) -> u16 {
        self.0
    }
}

pub struct Mq135<A> {
    adc: A,
}

impl<A: AnalogInput> Mq135<A> {
    pub fn new(adc: A) -> Self {
        Self { adc }
    }

    pub fn release(self) -> A {
        self.adc
    }

    /// Run one conversion and return its result.
    ///
    /// Spins on the completion flag with no timeout: a converter that never
    /// completes stalls the caller.
    pub fn sample(&mut self) -> RawGasSample {
        self.adc.start_conversion();
        while !self.adc.is_complete() {
            core::hint::spin_loop();
        }

        let sample = RawGasSample::new(self.adc.read_value());
        trace!("MQ135 raw {}", sample.value());
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ScriptedAdc;

    #[test]
    fn waits_for_conversion_to_complete() {
        let mut mq = Mq135::new(ScriptedAdc::new(&[321], 4));

        assert_eq!(mq.sample(), RawGasSample::new(321));

        let adc = mq.release();
        assert_eq!(adc.conversions(), 1);
        assert_eq!(adc.polls(), 5);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut mq = Mq135::new(ScriptedAdc::new(&[4095, 1023, 0], 0));

        assert_eq!(mq.sample().value(), 1023);
        assert_eq!(mq.sample().value(), 1023);
        assert_eq!(mq.sample().value(), 0);
    }
}
