/// Render a 64-bit virtual address (or any raw 64-bit register pattern) as
/// `0x` followed by 16 upper case hex digits.
pub fn format_vaddr(value: u64) -> String {
    format!("0x{value:016X}")
}

#[cfg(test)]
mod tests {
    use super::format_vaddr;

    #[test]
    fn pads_to_sixteen_digits() {
        assert_eq!(format_vaddr(0x1000), "0x0000000000001000");
        assert_eq!(format_vaddr(u64::MAX), "0xFFFFFFFFFFFFFFFF");
        assert_eq!(format_vaddr(0xc0ffee), "0x0000000000C0FFEE");
    }
}
