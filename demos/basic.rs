//! Basic example: a 14-bit long address split over two registers
//!
//! This example demonstrates:
//! - Building a value from a decoder mask list
//! - Sharing the register table with a transport through `CvStorage`
//! - Reading with a flaky register that needs a retry
//! - Editing the value and writing it back, last register first

use split_cv::prelude::*;

type Storage = CvStorage<32, 16>;
type Address = SplitValue<u16, RangePolicy, Listener, 2>;

// CV 17 holds the top six address bits under two fixed marker bits
const CV17: u16 = 17;
const CV18: u16 = 18;

struct Listener;

impl ValueListener for Listener {
    fn value_changed(&mut self, old: i64, new: i64) {
        println!("  value: {old} -> {new}");
    }

    fn state_changed(&mut self, state: RegisterState) {
        println!("  state: {state:?}");
    }

    fn busy_changed(&mut self, busy: bool) {
        println!("  busy: {busy}");
    }
}

/// Stand-in for the device on the other end of the command channel.
struct Device {
    registers: [u64; 32],
    glitches: u8,
}

impl Device {
    /// Answers every queued operation, delivering notifications in between.
    fn serve(&mut self, storage: &Storage, value: &mut Address) {
        loop {
            let op = storage.with_table(|table| {
                table.dispatch(|table, cv, note| value.on_notify(table, cv, note));
                table.next_op()
            });
            let Some(op) = op else { break };

            // Transport side, e.g. an interrupt handler
            storage.with_table(|table| match op {
                PendingOp::Read(cv) if self.glitches > 0 => {
                    self.glitches -= 1;
                    println!("  read CV {cv}: no acknowledge");
                    table.complete_read(cv, None);
                }
                PendingOp::Read(cv) => {
                    let data = self.registers[cv as usize];
                    println!("  read CV {cv}: {data:#04x}");
                    table.complete_read(cv, Some(data));
                }
                PendingOp::Write(cv) => {
                    let data = table.value(cv);
                    println!("  write CV {cv}: {data:#04x}");
                    self.registers[cv as usize] = data;
                    table.complete_write(cv, true);
                }
            });
        }
    }
}

fn main() {
    println!("=== Split Value Example ===\n");

    let storage = Storage::default();
    let mut value: Address = SplitValueBuilder::new()
        .capacity::<2>()
        .split_mask_text(&[CV18, CV17], "VVVVVVVV XXVVVVVV")
        .unwrap()
        .unit_scale()
        .entry_policy(RangePolicy::new(1, 10239))
        .listener(Listener)
        .build();

    storage.with_table(|table| {
        table.load(CV17, 0xC0).unwrap();
        table.load(CV18, 0x00).unwrap();
        value.attach(table).unwrap();
    });

    let mut device = Device {
        registers: [0; 32],
        glitches: 1,
    };
    device.registers[CV17 as usize] = 0xC4;
    device.registers[CV18 as usize] = 0xD2;

    println!("Reading...");
    storage.with_table(|table| value.read_all(table)).unwrap();
    device.serve(&storage, &mut value);
    println!("Address: {}\n", value.value_string());

    println!("Entering 3000...");
    storage
        .with_table(|table| value.enter_text(table, "3000"))
        .unwrap();
    println!("Entering 20000 (out of range)...");
    let rejected = storage.with_table(|table| value.enter_text(table, "20000"));
    println!("  {rejected:?}, display {}", value.value_string());

    println!("Writing...");
    storage.with_table(|table| value.write_all(table)).unwrap();
    device.serve(&storage, &mut value);

    println!(
        "\nDevice CV17 = {:#04x}, CV18 = {:#04x}, state {:?}",
        device.registers[CV17 as usize],
        device.registers[CV18 as usize],
        value.state()
    );
}
