use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};

/// 查詢 runtime file 記錄的 pid 是否仍在執行
pub struct ProcessTable {
    system: System,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    pub fn is_alive(&mut self, pid: u32) -> bool {
        let pid = Pid::from_u32(pid);
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        match self.system.process(pid) {
            Some(process) => !matches!(
                process.status(),
                ProcessStatus::Zombie | ProcessStatus::Dead
            ),
            None => false,
        }
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}
