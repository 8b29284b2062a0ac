//src/controllers/osc/mod.rs
//
// OSC control surface. Every parameter the keyboard can touch is also
// reachable over the wire, and the keyboard handlers themselves go through
// the loopback sender so both input paths converge on one command queue.

use nannou_osc as osc;
use std::error::Error;

#[derive(Debug)]
pub enum OscCommand {
    SetDepth {
        depth: f32,
    },
    SetQuality {
        tier_index: i32,
    },
    SetFov {
        degrees: f32,
    },
    SetTurnSeconds {
        seconds: f32,
    },
    SetBackground {
        r: f32,
        g: f32,
        b: f32,
    },
    LoadSample {
        name: String,
    },
    StartCapture,
}

pub struct OscController {
    command_queue: Vec<OscCommand>,
    receiver: osc::Receiver,
}

impl OscController {
    pub fn new(port: u16) -> Result<Self, Box<dyn Error>> {
        let receiver = osc::receiver(port)?;

        Ok(Self {
            command_queue: Vec::new(),
            receiver,
        })
    }

    pub fn process_messages(&mut self) {
        for (packet, _addr) in self.receiver.try_iter() {
            for message in packet.into_msgs() {
                match message.addr.as_str() {
                    "/logo/depth" => {
                        if let [osc::Type::Float(depth)] = &message.args[..] {
                            self.command_queue.push(OscCommand::SetDepth { depth: *depth });
                        }
                    }
                    "/logo/quality" => {
                        if let [osc::Type::Int(tier_index)] = &message.args[..] {
                            self.command_queue.push(OscCommand::SetQuality {
                                tier_index: *tier_index,
                            });
                        }
                    }
                    "/logo/sample" => {
                        if let [osc::Type::String(name)] = &message.args[..] {
                            self.command_queue.push(OscCommand::LoadSample {
                                name: name.clone(),
                            });
                        }
                    }
                    "/view/fov" => {
                        if let [osc::Type::Float(degrees)] = &message.args[..] {
                            self.command_queue.push(OscCommand::SetFov {
                                degrees: *degrees,
                            });
                        }
                    }
                    "/view/turn" => {
                        if let [osc::Type::Float(seconds)] = &message.args[..] {
                            self.command_queue.push(OscCommand::SetTurnSeconds {
                                seconds: *seconds,
                            });
                        }
                    }
                    "/view/background" => {
                        if let [osc::Type::Float(r), osc::Type::Float(g), osc::Type::Float(b)] =
                            &message.args[..]
                        {
                            self.command_queue.push(OscCommand::SetBackground {
                                r: *r,
                                g: *g,
                                b: *b,
                            });
                        }
                    }
                    "/capture/start" => {
                        self.command_queue.push(OscCommand::StartCapture);
                    }
                    _ => println!("Unknown OSC address pattern: {}", message.addr),
                };
            }
        }
    }

    pub fn take_commands(&mut self) -> Vec<OscCommand> {
        std::mem::take(&mut self.command_queue)
    }
}

pub struct OscSender {
    sender: osc::Sender,
    target_addr: String,
    target_port: u16,
}

impl OscSender {
    pub fn new(target_port: u16) -> Result<Self, Box<dyn Error>> {
        let target_addr = "127.0.0.1".to_string();
        let sender = osc::sender()?;

        Ok(Self {
            sender,
            target_addr,
            target_port,
        })
    }

    pub fn send_depth(&self, depth: f32) {
        let addr = "/logo/depth".to_string();
        let args = vec![osc::Type::Float(depth)];
        self.sender
            .send((addr, args), (self.target_addr.as_str(), self.target_port))
            .ok();
    }

    pub fn send_quality(&self, tier_index: i32) {
        let addr = "/logo/quality".to_string();
        let args = vec![osc::Type::Int(tier_index)];
        self.sender
            .send((addr, args), (self.target_addr.as_str(), self.target_port))
            .ok();
    }

    pub fn send_sample(&self, name: &str) {
        let addr = "/logo/sample".to_string();
        let args = vec![osc::Type::String(name.to_string())];
        self.sender
            .send((addr, args), (self.target_addr.as_str(), self.target_port))
            .ok();
    }

    pub fn send_fov(&self, degrees: f32) {
        let addr = "/view/fov".to_string();
        let args = vec![osc::Type::Float(degrees)];
        self.sender
            .send((addr, args), (self.target_addr.as_str(), self.target_port))
            .ok();
    }

    pub fn send_turn_seconds(&self, seconds: f32) {
        let addr = "/view/turn".to_string();
        let args = vec![osc::Type::Float(seconds)];
        self.sender
            .send((addr, args), (self.target_addr.as_str(), self.target_port))
            .ok();
    }

    pub fn send_background(&self, r: f32, g: f32, b: f32) {
        let addr = "/view/background".to_string();
        let args = vec![
            osc::Type::Float(r),
            osc::Type::Float(g),
            osc::Type::Float(b),
        ];
        self.sender
            .send((addr, args), (self.target_addr.as_str(), self.target_port))
            .ok();
    }

    pub fn send_start_capture(&self) {
        let addr = "/capture/start".to_string();
        self.sender
            .send((addr, vec![]), (self.target_addr.as_str(), self.target_port))
            .ok();
    }
}
