use uvm_types::{Flags, REGISTER_COUNT, RegisterId, RegisterValue, format_vaddr};

/// The last known value of one register.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterSlot {
    pub id: RegisterId,
    pub name: String,
    /// Bit pattern as sent by the server
    pub raw: u64,
    pub value: RegisterValue,
    /// Whether the last update changed the value
    pub changed: bool,
}

impl RegisterSlot {
    fn new(id: RegisterId) -> Self {
        Self {
            id,
            name: id.to_string(),
            raw: 0,
            value: RegisterValue::from_raw(id.class(), 0),
            changed: false,
        }
    }

    /// The raw value as `0x` and sixteen hex digits
    pub fn hex(&self) -> String {
        format_vaddr(self.raw)
    }
}

/// Every register the VM exposes, in id order.
///
/// The bank is populated once and updated in place; it never grows or shrinks.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterBank {
    slots: Vec<RegisterSlot>,
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBank {
    pub fn new() -> Self {
        let slots: Vec<_> = RegisterId::all().map(RegisterSlot::new).collect();
        debug_assert_eq!(slots.len(), REGISTER_COUNT);
        Self { slots }
    }

    /// Store new values, marking each slot whose value differs numerically from
    /// the previous one. Slots missing from `values` are left unmarked.
    pub fn apply(&mut self, values: &[(RegisterId, u64)]) {
        for slot in &mut self.slots {
            slot.changed = false;
        }
        for &(id, raw) in values {
            let Some(slot) = self.slot_mut(id) else {
                continue;
            };
            let value = RegisterValue::from_raw(id.class(), raw);
            slot.changed |= value != slot.value;
            slot.raw = raw;
            slot.value = value;
        }
    }

    fn slot_mut(&mut self, id: RegisterId) -> Option<&mut RegisterSlot> {
        self.slots.get_mut(usize::from(id.raw()) - 1)
    }

    pub fn get(&self, id: RegisterId) -> Option<&RegisterSlot> {
        self.slots.get(usize::from(id.raw()) - 1)
    }

    pub fn slots(&self) -> &[RegisterSlot] {
        &self.slots
    }

    pub fn ip(&self) -> u64 {
        self.get(RegisterId::IP).map(|slot| slot.raw).unwrap_or_default()
    }

    pub fn flags(&self) -> Flags {
        self.get(RegisterId::FL)
            .map(|slot| Flags::from_raw(slot.raw))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use uvm_types::RegisterId;

    use super::*;

    fn id(raw: u8) -> RegisterId {
        RegisterId::new(raw).unwrap()
    }

    #[test]
    fn populated_for_every_register() {
        let bank = RegisterBank::new();
        assert_eq!(bank.slots().len(), REGISTER_COUNT);
        assert_eq!(bank.slots()[0].name, "ip");
        assert_eq!(bank.slots()[4].name, "r0");
        assert_eq!(bank.slots()[20].name, "f0");
        assert!(bank.slots().iter().all(|slot| !slot.changed));
    }

    #[rstest]
    #[case(0x05, (-7i64) as u64, RegisterValue::Integer(-7))]
    #[case(0x15, 2.5f64.to_bits(), RegisterValue::Float(2.5))]
    #[case(0x01, 0x40, RegisterValue::Integer(0x40))]
    fn values_follow_register_class(
        #[case] raw_id: u8,
        #[case] raw: u64,
        #[case] expected: RegisterValue,
    ) {
        let mut bank = RegisterBank::new();
        bank.apply(&[(id(raw_id), raw)]);

        let slot = bank.get(id(raw_id)).unwrap();
        assert_eq!(slot.value, expected);
        assert_eq!(slot.raw, raw);
        assert!(slot.changed);
    }

    #[test]
    fn repeated_values_are_not_changed() {
        let mut bank = RegisterBank::new();
        let values = [(RegisterId::IP, 0x64), (id(0x06), 12)];

        bank.apply(&values);
        assert!(bank.get(RegisterId::IP).unwrap().changed);

        bank.apply(&values);
        assert!(bank.slots().iter().all(|slot| !slot.changed));
    }

    #[test]
    fn omitted_registers_lose_their_mark() {
        let mut bank = RegisterBank::new();
        bank.apply(&[(id(0x05), 3)]);
        assert!(bank.get(id(0x05)).unwrap().changed);

        bank.apply(&[(RegisterId::IP, 0x40), (RegisterId::IP, 0x40)]);
        assert!(!bank.get(id(0x05)).unwrap().changed);
        assert_eq!(bank.get(id(0x05)).unwrap().raw, 3);
        assert!(bank.get(RegisterId::IP).unwrap().changed);
    }

    #[test]
    fn negative_zero_float_is_not_a_change() {
        let mut bank = RegisterBank::new();
        bank.apply(&[(id(0x15), (-0.0f64).to_bits())]);

        let slot = bank.get(id(0x15)).unwrap();
        assert!(!slot.changed);
        assert_eq!(slot.raw, 0x8000_0000_0000_0000);
    }

    #[test]
    fn hex_and_flags() {
        let mut bank = RegisterBank::new();
        bank.apply(&[(RegisterId::FL, 0xA000_0000_0000_0000), (RegisterId::IP, 0x40)]);

        assert_eq!(bank.ip(), 0x40);
        assert_eq!(
            bank.get(RegisterId::FL).unwrap().hex(),
            "0xA000000000000000"
        );
        assert_eq!(
            bank.flags(),
            Flags {
                carry: true,
                zero: false,
                sign: true
            }
        );
    }
}
